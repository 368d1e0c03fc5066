use serde_json::json;
use sketchseek_common::protocol::{
    CreateDesignRequest, HistoryResponse, InputMode, JobState, JobStatus, SearchRequest,
    SearchResponse, SessionId,
};

#[test]
fn test_job_status_sparse_payload() {
    let status: JobStatus = serde_json::from_value(json!({
        "job_id": "7b1c",
        "status": "queued",
        "progress": 0.0
    }))
    .unwrap();

    assert_eq!(status.job_id.as_str(), "7b1c");
    assert_eq!(status.status, JobState::Queued);
    assert!(status.ai_image_url.is_none());
    assert!(status.keywords.is_none());
    assert!(status.dominant_color.is_none());
    assert!(status.error_code.is_none());
}

#[test]
fn test_job_status_full_payload() {
    let status: JobStatus = serde_json::from_value(json!({
        "job_id": "7b1c",
        "status": "done",
        "progress": 1.0,
        "ai_image_url": "/static/gen/7b1c.png",
        "keywords": ["minimal", "hexagon"],
        "dominant_color": "#112233",
        "error_code": null
    }))
    .unwrap();

    assert_eq!(status.status, JobState::Done);
    assert_eq!(
        status.keywords.as_deref(),
        Some(&["minimal".to_string(), "hexagon".to_string()][..])
    );
    assert_eq!(status.dominant_color.as_deref(), Some("#112233"));
}

#[test]
fn test_unknown_job_state_is_rejected() {
    let result = serde_json::from_value::<JobStatus>(json!({
        "job_id": "1",
        "status": "paused",
        "progress": 0.5
    }));
    assert!(result.is_err());
}

#[test]
fn test_job_state_ordering_and_terminality() {
    assert!(JobState::Queued < JobState::Running);
    assert!(JobState::Running < JobState::Done);
    assert!(!JobState::Queued.is_terminal());
    assert!(!JobState::Running.is_terminal());
    assert!(JobState::Done.is_terminal());
    assert!(JobState::Failed.is_terminal());
}

#[test]
fn test_create_design_request_omits_absent_fields() {
    let req = CreateDesignRequest {
        session_id: SessionId::new("s-1"),
        input_mode: InputMode::Text,
        category_hint: None,
        text_prompt: Some("blue hexagon logo".into()),
        canvas_data: None,
    };

    let value = serde_json::to_value(&req).unwrap();
    assert_eq!(
        value,
        json!({
            "session_id": "s-1",
            "input_mode": "text",
            "text_prompt": "blue hexagon logo"
        })
    );
}

#[test]
fn test_search_request_wire_shape() {
    let req = SearchRequest {
        design_id: "d-9".into(),
        providers: Some(vec!["mock".into(), "api".into()]),
        limit: Some(12),
    };
    let value = serde_json::to_value(&req).unwrap();
    assert_eq!(
        value,
        json!({ "design_id": "d-9", "providers": ["mock", "api"], "limit": 12 })
    );
}

#[test]
fn test_search_response_score_names() {
    let resp: SearchResponse = serde_json::from_value(json!({
        "results": [{
            "title": "Hex Logo Pack",
            "image_url": null,
            "product_url": "https://example.com/p/1",
            "price": 19.0,
            "score_overall": 0.82,
            "score_keyword": 0.9,
            "score_color": 0.7,
            "score_embedding": 0.75,
            "explanation": ["keyword match: hexagon"]
        }]
    }))
    .unwrap();

    let item = &resp.results[0];
    assert_eq!(item.title, "Hex Logo Pack");
    assert_eq!(item.overall, 0.82);
    assert_eq!(item.keyword, 0.9);
    assert_eq!(item.color, 0.7);
    assert_eq!(item.embedding, 0.75);
    assert_eq!(item.price, Some(19.0));
    assert_eq!(item.explanation, vec!["keyword match: hexagon".to_string()]);
}

#[test]
fn test_history_response_defaults() {
    let resp: HistoryResponse = serde_json::from_value(json!({
        "session_id": "s-1",
        "items": [{
            "design_id": "d-1",
            "text_prompt": null,
            "category_hint": "Logo",
            "input_mode": "canvas",
            "created_at": "2025-01-02T10:00:00Z"
        }],
        "total": 1
    }))
    .unwrap();

    assert_eq!(resp.total, 1);
    let item = &resp.items[0];
    assert_eq!(item.input_mode, InputMode::Canvas);
    assert!(item.keywords.is_empty());
    assert!(item.top_results.is_empty());
    assert_eq!(item.category_hint.as_deref(), Some("Logo"));
}
