use crate::poller::JobSnapshot;
use crate::workflow::{ErrorKind, LoadingStage, LoadingView, ResultsView, WorkflowState};
use sketchseek_common::protocol::{HistoryItem, SearchResultItem};

pub fn format_state(state: &WorkflowState) -> String {
    match state {
        WorkflowState::Idle => "Ready.".to_string(),
        WorkflowState::Loading(view) => format_loading(view),
        WorkflowState::Results(view) => format_results(view),
        WorkflowState::Error(view) => match view.kind {
            ErrorKind::JobFailed => format!("Processing failed: {}", view.message),
            _ => format!("Error: {}", view.message),
        },
    }
}

pub fn format_loading(view: &LoadingView) -> String {
    match (view.stage, &view.job) {
        (LoadingStage::Session, _) => "Starting session...".to_string(),
        (LoadingStage::Design, _) => "Uploading design...".to_string(),
        (LoadingStage::Processing, None) => "Starting processing...".to_string(),
        (_, Some(job)) => format!("{}... {}%", capitalize(job.phase().label()), job.percent()),
        (LoadingStage::Search, None) => "Searching...".to_string(),
    }
}

pub fn format_results(view: &ResultsView) -> String {
    let mut output = String::new();

    let analysis = format_analysis(&view.job);
    if !analysis.is_empty() {
        output.push_str(&analysis);
        output.push_str("\n\n");
    }

    if view.is_empty() {
        output.push_str("No matching designs found.");
        return output;
    }

    output.push_str(&format!("Found {} designs:", view.items.len()));
    for (i, item) in view.items.iter().enumerate() {
        output.push('\n');
        output.push_str(&format_item(i + 1, item));
    }
    output
}

fn format_analysis(job: &JobSnapshot) -> String {
    let mut lines = Vec::new();
    if let Some(url) = &job.ai_image_url {
        lines.push(format!("AI reference: {}", url));
    }
    if !job.keywords.is_empty() {
        lines.push(format!("Keywords: {}", job.keywords.join(", ")));
    }
    if let Some(color) = &job.dominant_color {
        lines.push(format!("Dominant color: {}", color));
    }
    lines.join("\n")
}

fn format_item(rank: usize, item: &SearchResultItem) -> String {
    let mut output = format!("{:>2}. {} [{}%]", rank, item.title, score_percent(item.overall));
    if let Some(price) = item.price {
        output.push_str(&format!(" ${:.2}", price));
    }
    output.push_str(&format!(
        "\n    keyword {}% | color {}% | embedding {}%",
        score_percent(item.keyword),
        score_percent(item.color),
        score_percent(item.embedding)
    ));
    if let Some(url) = &item.product_url {
        output.push_str(&format!("\n    {}", url));
    }
    for reason in &item.explanation {
        output.push_str(&format!("\n    - {}", reason));
    }
    output
}

pub fn format_history(items: &[HistoryItem]) -> String {
    if items.is_empty() {
        return "No history yet.".to_string();
    }

    let mut output = format!("{} past designs:", items.len());
    for item in items {
        let subject = item
            .text_prompt
            .as_deref()
            .map(|p| format!("\"{}\"", p))
            .unwrap_or_else(|| "(sketch)".to_string());
        output.push_str(&format!("\n- {} {} [{}]", item.created_at, subject, item.input_mode));
        if let Some(category) = &item.category_hint {
            output.push_str(&format!(" ({})", category));
        }
        if !item.keywords.is_empty() {
            output.push_str(&format!("\n    Keywords: {}", item.keywords.join(", ")));
        }
        for result in &item.top_results {
            output.push_str(&format!(
                "\n    * {} [{}%]",
                result.title,
                score_percent(result.score_overall)
            ));
        }
    }
    output
}

fn score_percent(score: f64) -> u32 {
    if score.is_nan() {
        return 0;
    }
    (score.clamp(0.0, 1.0) * 100.0).round() as u32
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
