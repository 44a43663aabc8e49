mod common;

use common::{shipping_info, spawn_app};
use serde_json::json;

#[tokio::test]
async fn customer_places_an_order() {
    let app = spawn_app().await;
    let customer = app.customer_token("Lan", "lan@mail.vn").await;
    let car = app.add_vehicle("VF 8", 1_000, 5);
    let bike = app.add_vehicle("Air Blade", 300, 2);

    let reply = app
        .send_json(
            "POST",
            "/api/orders",
            Some(&customer),
            &json!({
                "items": [
                    {"vehicle": car.id, "quantity": 2},
                    {"vehicle": bike.id.to_string(), "quantity": "1"}
                ],
                "shippingInfo": shipping_info()
            }),
        )
        .await;
    assert_eq!(reply.status, 201, "{}", reply.text());
    let order = reply.json()["data"].clone();
    assert_eq!(order["totalPrice"], 2_300);
    assert_eq!(order["status"], "Chờ xử lý");
    assert_eq!(order["orderItems"][0]["name"], "VF 8");
    assert_eq!(order["orderItems"][0]["price"], 1_000);
    assert_eq!(order["orderItems"][1]["vehicle"], bike.id);
    assert_eq!(order["shippingInfo"]["phoneNo"], "0900000000");
    assert!(order["user"].is_i64());

    assert_eq!(app.stock_of(car.id), 3);
    assert_eq!(app.stock_of(bike.id), 1);
}

#[tokio::test]
async fn order_items_keep_the_price_paid() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let customer = app.customer_token("Lan", "lan@mail.vn").await;
    let car = app.add_vehicle("VF 8", 1_000, 5);

    let placed = app
        .send_json(
            "POST",
            "/api/orders",
            Some(&customer),
            &json!({"items": [{"vehicle": car.id, "quantity": 1}], "shippingInfo": shipping_info()}),
        )
        .await
        .json();
    let order_id = placed["data"]["_id"].as_i64().expect("order id");

    let reply = app
        .send_json(
            "PUT",
            &format!("/api/vehicles/{}", car.id),
            Some(&admin),
            &json!({"price": 5_000, "name": "VF 8 Plus"}),
        )
        .await;
    assert_eq!(reply.status, 200);

    let order = app
        .get(&format!("/api/orders/{order_id}"), Some(&customer))
        .await
        .json();
    assert_eq!(order["data"]["orderItems"][0]["price"], 1_000);
    assert_eq!(order["data"]["orderItems"][0]["name"], "VF 8");
    assert_eq!(order["data"]["totalPrice"], 1_000);
}

#[tokio::test]
async fn insufficient_stock_rolls_back_every_line() {
    let app = spawn_app().await;
    let customer = app.customer_token("Lan", "lan@mail.vn").await;
    let car = app.add_vehicle("VF 8", 1_000, 5);
    let bike = app.add_vehicle("Air Blade", 300, 1);

    let reply = app
        .send_json(
            "POST",
            "/api/orders",
            Some(&customer),
            &json!({
                "items": [
                    {"vehicle": car.id, "quantity": 2},
                    {"vehicle": bike.id, "quantity": 3}
                ],
                "shippingInfo": shipping_info()
            }),
        )
        .await;
    assert_eq!(reply.status, 400);
    assert_eq!(
        reply.json(),
        json!({"success": false, "message": "Not enough stock for Air Blade. Only 1 left."})
    );
    assert_eq!(app.stock_of(car.id), 5);
    assert_eq!(app.stock_of(bike.id), 1);

    let mine = app.get("/api/orders/my-orders", Some(&customer)).await.json();
    assert_eq!(mine["count"], 0);
}

#[tokio::test]
async fn repeated_lines_share_the_stock() {
    let app = spawn_app().await;
    let customer = app.customer_token("Lan", "lan@mail.vn").await;
    let car = app.add_vehicle("VF 8", 1_000, 3);

    let reply = app
        .send_json(
            "POST",
            "/api/orders",
            Some(&customer),
            &json!({
                "items": [
                    {"vehicle": car.id, "quantity": 2},
                    {"vehicle": car.id, "quantity": 2}
                ],
                "shippingInfo": shipping_info()
            }),
        )
        .await;
    assert_eq!(reply.status, 400);
    assert_eq!(app.stock_of(car.id), 3);
}

#[tokio::test]
async fn order_request_validation() {
    let app = spawn_app().await;
    let customer = app.customer_token("Lan", "lan@mail.vn").await;
    let car = app.add_vehicle("VF 8", 1_000, 3);

    let reply = app
        .send_json(
            "POST",
            "/api/orders",
            Some(&customer),
            &json!({"items": [], "shippingInfo": shipping_info()}),
        )
        .await;
    assert_eq!(reply.status, 400);
    assert_eq!(reply.json()["message"], "No order items provided");

    let reply = app
        .send_json(
            "POST",
            "/api/orders",
            Some(&customer),
            &json!({"items": [{"vehicle": car.id, "quantity": 0}]}),
        )
        .await;
    assert_eq!(reply.status, 400);
    let paths: Vec<String> = reply.json()["errors"]
        .as_array()
        .expect("errors")
        .iter()
        .filter_map(|e| e["path"].as_str().map(String::from))
        .collect();
    assert!(paths.contains(&"items[0].quantity".to_string()));
    assert!(paths.contains(&"shippingInfo.address".to_string()));

    let reply = app
        .send_json(
            "POST",
            "/api/orders",
            Some(&customer),
            &json!({"items": [{"vehicle": 9_999, "quantity": 1}], "shippingInfo": shipping_info()}),
        )
        .await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.json()["message"], "Vehicle not found: 9999");
    assert_eq!(app.stock_of(car.id), 3);
}

#[tokio::test]
async fn only_customers_place_orders() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let car = app.add_vehicle("VF 8", 1_000, 3);

    let reply = app
        .send_json(
            "POST",
            "/api/orders",
            Some(&admin),
            &json!({"items": [{"vehicle": car.id, "quantity": 1}], "shippingInfo": shipping_info()}),
        )
        .await;
    assert_eq!(reply.status, 403);
    assert_eq!(
        reply.json()["message"],
        "User role 'admin' is not authorized to access this route"
    );
    assert_eq!(app.stock_of(car.id), 3);
}

#[tokio::test]
async fn orders_are_private_to_their_owner() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let lan = app.customer_token("Lan", "lan@mail.vn").await;
    let minh = app.customer_token("Minh", "minh@mail.vn").await;
    let car = app.add_vehicle("VF 8", 1_000, 5);

    let placed = app
        .send_json(
            "POST",
            "/api/orders",
            Some(&lan),
            &json!({"items": [{"vehicle": car.id, "quantity": 1}], "shippingInfo": shipping_info()}),
        )
        .await
        .json();
    let path = format!("/api/orders/{}", placed["data"]["_id"]);

    let reply = app.get(&path, Some(&minh)).await;
    assert_eq!(reply.status, 403);
    assert_eq!(reply.json()["message"], "Not authorized to view this order");

    let reply = app.get(&path, Some(&lan)).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.json()["data"]["user"]["name"], "Lan");

    let reply = app.get(&path, Some(&admin)).await;
    assert_eq!(reply.status, 200);

    let reply = app.get("/api/orders/424242", Some(&admin)).await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.json()["message"], "Order not found");

    assert_eq!(app.get("/api/orders/my-orders", Some(&lan)).await.json()["count"], 1);
    assert_eq!(app.get("/api/orders/my-orders", Some(&minh)).await.json()["count"], 0);

    let reply = app.get("/api/orders", Some(&lan)).await;
    assert_eq!(reply.status, 403);
}

#[tokio::test]
async fn admin_manages_orders() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let customer = app.customer_token("Lan", "lan@mail.vn").await;
    let car = app.add_vehicle("VF 8", 1_000, 5);

    let mut ids = Vec::new();
    for _ in 0..2 {
        let placed = app
            .send_json(
                "POST",
                "/api/orders",
                Some(&customer),
                &json!({"items": [{"vehicle": car.id, "quantity": 1}], "shippingInfo": shipping_info()}),
            )
            .await
            .json();
        ids.push(placed["data"]["_id"].as_i64().expect("order id"));
    }

    let all = app.get("/api/orders", Some(&admin)).await.json();
    assert_eq!(all["count"], 2);
    assert_eq!(all["data"][0]["_id"], ids[1], "newest first");
    assert_eq!(all["data"][0]["user"]["email"], "lan@mail.vn");

    let path = format!("/api/orders/{}", ids[0]);
    let reply = app
        .send_json("PUT", &path, Some(&admin), &json!({"status": "Đã giao"}))
        .await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.json()["data"]["status"], "Đã giao");

    let reply = app
        .send_json("PUT", &path, Some(&admin), &json!({"status": "Lost"}))
        .await;
    assert_eq!(reply.status, 400);
    assert_eq!(reply.json()["errors"][0]["path"], "status");

    let reply = app.delete(&path, Some(&admin)).await;
    assert_eq!(reply.status, 200);
    assert_eq!(app.stock_of(car.id), 3, "deleting an order does not restock");

    let reply = app.delete(&path, Some(&admin)).await;
    assert_eq!(reply.status, 404);
}
