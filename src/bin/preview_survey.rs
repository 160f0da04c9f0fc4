//! Prints the fill-mode rendering of a survey JSON file, one question per
//! block, the way a respondent would see it.

use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};

use surveymate_lib::survey::{render_fillable, Survey, Widget};

fn main() -> Result<()> {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("用法: preview_survey <问卷文件.json>"))?;
    let raw = fs::read_to_string(&path).with_context(|| format!("无法读取 {}", path))?;
    let survey: Survey =
        serde_json::from_str(&raw).with_context(|| format!("问卷文件解析失败: {}", path))?;

    let fillable = render_fillable(&survey);

    println!("《{}》", fillable.title);
    if !fillable.description.is_empty() {
        println!("{}", fillable.description);
    }
    println!(
        "目标人群: {} | 预计用时: {} 分钟",
        if fillable.target_audience.is_empty() {
            "不限"
        } else {
            fillable.target_audience.as_str()
        },
        fillable.estimated_time
    );

    for question in &fillable.questions {
        println!(
            "\n{}. [{}] {}{}",
            question.number,
            question.type_badge,
            question.text,
            if question.required { " *" } else { "" }
        );
        print_widget(&question.widget);
    }

    Ok(())
}

fn print_widget(widget: &Widget) {
    match widget {
        Widget::Choices { multiple, options } => {
            let marker = if *multiple { "[ ]" } else { "( )" };
            for option in options {
                if option.is_other {
                    println!("   {} {}  ______（选中后填写）", marker, option.label);
                } else {
                    println!("   {} {}", marker, option.label);
                }
            }
        }
        Widget::Scale {
            steps,
            min_label,
            max_label,
        } => {
            let row: Vec<String> = steps
                .iter()
                .map(|step| match &step.label {
                    Some(label) => format!("{}({})", step.value, label),
                    None => step.value.to_string(),
                })
                .collect();
            println!("   {}", row.join("  "));
            if min_label.is_some() || max_label.is_some() {
                println!(
                    "   {} ←→ {}",
                    min_label.as_deref().unwrap_or(""),
                    max_label.as_deref().unwrap_or("")
                );
            }
        }
        Widget::Matrix {
            columns,
            rows,
            choices,
        } => {
            let range: Vec<String> = choices.iter().map(|c| c.value.to_string()).collect();
            println!("   评分范围: {}", range.join("/"));
            println!("   维度: {}", columns.join(" | "));
            for row in rows {
                println!("   {} → 每个维度各打一分", row);
            }
        }
        Widget::Nps {
            steps,
            low_label,
            high_label,
        } => {
            let row: Vec<String> = steps.iter().map(i32::to_string).collect();
            println!("   {}", row.join(" "));
            if low_label.is_some() || high_label.is_some() {
                println!(
                    "   {} ←→ {}",
                    low_label.as_deref().unwrap_or(""),
                    high_label.as_deref().unwrap_or("")
                );
            }
        }
        Widget::OpenText { placeholder } => {
            println!("   ________（{}）", placeholder);
        }
    }
}
