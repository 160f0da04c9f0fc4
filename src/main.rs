use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};
use log::info;

use surveymate_lib::backend::BackendClient;
use surveymate_lib::config::AppConfig;
use surveymate_lib::generation::GenerationClient;
use surveymate_lib::progress::ProgressUpdate;
use surveymate_lib::session::{self, FileStore, MemoryStore};
use surveymate_lib::survey::SurveyEditor;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let config = AppConfig::from_env();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("generate") => {
            let prompt = args
                .get(1)
                .ok_or_else(|| anyhow!("用法: surveymate generate <需求描述>"))?;
            generate_and_publish(&config, prompt).await
        }
        Some("submit") => {
            let survey_id = args
                .get(1)
                .ok_or_else(|| anyhow!("用法: surveymate submit <问卷ID> <答案文件.json>"))?;
            let answers_file = args
                .get(2)
                .ok_or_else(|| anyhow!("用法: surveymate submit <问卷ID> <答案文件.json>"))?;
            submit_from_file(&config, survey_id, answers_file).await
        }
        _ => {
            eprintln!("用法:");
            eprintln!("  surveymate generate <需求描述>");
            eprintln!("  surveymate submit <问卷ID> <答案文件.json>");
            Ok(())
        }
    }
}

/// Generate a survey from the prompt, publish it as-is and print the share
/// link. Progress and thinking messages stream to stdout as they arrive.
async fn generate_and_publish(config: &AppConfig, prompt: &str) -> Result<()> {
    let generator = GenerationClient::new(&config.api_base);

    println!("正在生成问卷，请稍候...");
    let outcome = generator
        .generate(prompt, |update: &ProgressUpdate| {
            if let Some(thinking) = &update.thinking {
                println!("  · {}", thinking);
            } else {
                println!("[{:>3.0}%] {}", update.progress, update.status);
            }
        })
        .await;

    let survey = match outcome {
        Ok(survey) => survey,
        Err(err) => {
            if let Some(url) = err.help_url() {
                eprintln!("{}", err);
                eprintln!("请检查您的用量与配额: {}", url);
            } else if err.is_retryable() {
                eprintln!("{}", err);
                eprintln!("网络似乎不稳定，请稍后重试。");
            }
            return Err(err.into());
        }
    };

    info!("生成完成: {} ({} 题)", survey.title, survey.questions.len());
    println!("\n《{}》 共 {} 题", survey.title, survey.questions.len());

    let editor = SurveyEditor::with_survey(survey);
    let snapshot = editor
        .snapshot_for_export()
        .ok_or_else(|| anyhow!("没有可发布的问卷"))?;

    let store = FileStore::open(&config.session_file);
    let session_id = session::session_id(&store);

    let backend = BackendClient::new(&config.api_base);
    let survey_id = backend
        .save_survey(&snapshot, session_id.as_deref())
        .await?;

    println!("发布成功！分享链接: {}", backend.share_url(&survey_id));
    Ok(())
}

/// Submit a prepared answers file (a JSON mapping of question id to answer
/// value, the shape `ResponseCollector::to_submission` produces).
async fn submit_from_file(config: &AppConfig, survey_id: &str, answers_file: &str) -> Result<()> {
    let raw = fs::read_to_string(answers_file)
        .with_context(|| format!("无法读取答案文件 {}", answers_file))?;
    let answers: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("答案文件不是合法的JSON: {}", answers_file))?;
    if !answers.is_object() {
        return Err(anyhow!("答案文件必须是 问题ID -> 答案 的JSON对象"));
    }

    let user_store = MemoryStore::new();
    let user_id = session::ensure_user_id(&user_store);

    let backend = BackendClient::new(&config.api_base);
    backend.submit_response(survey_id, &answers, &user_id).await?;

    println!("提交成功，感谢您的参与！");
    Ok(())
}
