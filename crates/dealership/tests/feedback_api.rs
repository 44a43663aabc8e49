mod common;

use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn anyone_can_send_feedback() {
    let app = spawn_app().await;

    let reply = app
        .send_json(
            "POST",
            "/api/feedback",
            None,
            &json!({"name": "Minh", "email": "Minh@Mail.VN", "subject": "Test drive", "message": "Can I book one?"}),
        )
        .await;
    assert_eq!(reply.status, 201);
    let data = reply.json()["data"].clone();
    assert_eq!(data["email"], "minh@mail.vn");
    assert_eq!(data["subject"], "Test drive");
    assert!(data["_id"].is_i64());
    assert!(data["createdAt"].is_string());

    let reply = app
        .send_json("POST", "/api/feedback", None, &json!({"name": "Minh"}))
        .await;
    assert_eq!(reply.status, 400);
    let paths: Vec<String> = reply.json()["errors"]
        .as_array()
        .expect("errors")
        .iter()
        .filter_map(|e| e["path"].as_str().map(String::from))
        .collect();
    assert_eq!(paths, ["email", "message"]);
}

#[tokio::test]
async fn admins_read_feedback_newest_first() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let customer = app.customer_token("Lan", "lan@mail.vn").await;

    for message in ["first", "second"] {
        let reply = app
            .send_json(
                "POST",
                "/api/feedback",
                None,
                &json!({"name": "Minh", "email": "minh@mail.vn", "message": message}),
            )
            .await;
        assert_eq!(reply.status, 201);
    }

    let reply = app.get("/api/feedback/admin", Some(&customer)).await;
    assert_eq!(reply.status, 403);

    let body = app.get("/api/feedback/admin", Some(&admin)).await.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["message"], "second");
    assert!(body["data"][0].get("subject").is_none());
}
