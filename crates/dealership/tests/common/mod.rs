//! Shared harness: boots the router on an ephemeral port and speaks raw
//! HTTP/1.1 to it.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use dealership::auth::hash_password;
use dealership::model::{NewUser, NewVehicle, Permissions, Role, Vehicle, VehicleType};
use dealership::seed;
use dealership::{build_router, AppState, Config, Storage};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const PASSWORD: &str = "secret123";

pub struct TestApp {
    pub addr: SocketAddr,
    pub state: AppState,
    pub uploads: TempDir,
}

pub struct Reply {
    pub status: u16,
    pub head: String,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

pub fn test_config(uploads: &Path) -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = Some(TEST_SECRET.to_string());
    config.uploads.directory = Some(uploads.to_path_buf());
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let uploads = tempdir().expect("tempdir");
    let mut config = test_config(uploads.path());
    customize(&mut config);
    let storage = Storage::open_in_memory().expect("open storage");
    let state = AppState::new(storage, config).expect("app state");

    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    TestApp {
        addr,
        state,
        uploads,
    }
}

pub async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> Reply {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Length: {}\r\n",
        body.len()
    );
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    req.push_str("\r\n");
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request head");
    stream.write_all(body).await.expect("write request body");

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");
    let split = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("http response must have separator");
    let head = String::from_utf8_lossy(&response[..split]).into_owned();
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    Reply {
        status,
        head,
        body: response[split + 4..].to_vec(),
    }
}

impl TestApp {
    pub async fn get(&self, path: &str, token: Option<&str>) -> Reply {
        let auth = token.map(|t| format!("Bearer {t}"));
        let mut headers = Vec::new();
        if let Some(auth) = &auth {
            headers.push(("Authorization", auth.as_str()));
        }
        send_raw(self.addr, "GET", path, &headers, b"").await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Reply {
        let auth = token.map(|t| format!("Bearer {t}"));
        let mut headers = Vec::new();
        if let Some(auth) = &auth {
            headers.push(("Authorization", auth.as_str()));
        }
        send_raw(self.addr, "DELETE", path, &headers, b"").await
    }

    pub async fn send_json(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Reply {
        let auth = token.map(|t| format!("Bearer {t}"));
        let mut headers = vec![("Content-Type", "application/json")];
        if let Some(auth) = &auth {
            headers.push(("Authorization", auth.as_str()));
        }
        let body = serde_json::to_vec(body).expect("encode body");
        send_raw(self.addr, method, path, &headers, &body).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Reply {
        self.send_json(
            "POST",
            "/api/auth/login",
            None,
            &json!({"email": email, "password": password}),
        )
        .await
    }

    pub async fn token_for(&self, email: &str, password: &str) -> String {
        let reply = self.login(email, password).await;
        assert_eq!(reply.status, 200, "login failed: {}", reply.text());
        reply.json()["token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        seed::create_admin(
            &self.state.storage().expect("storage"),
            "admin@example.com",
            PASSWORD,
            "Admin User",
        )
        .expect("create admin");
        self.token_for("admin@example.com", PASSWORD).await
    }

    /// Register a customer over HTTP and return their token.
    pub async fn customer_token(&self, name: &str, email: &str) -> String {
        let reply = self
            .send_json(
                "POST",
                "/api/auth/register",
                None,
                &json!({"name": name, "email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(reply.status, 201, "register failed: {}", reply.text());
        reply.json()["token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    /// Create a staff account directly in storage and log in as it.
    pub async fn staff_token(&self, email: &str, permissions: Permissions) -> String {
        let hash = hash_password(PASSWORD).expect("hash");
        let user = NewUser {
            name: "Staff".to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            role: Role::User,
            can_access_dashboard: true,
            permissions,
        };
        self.state
            .storage()
            .expect("storage")
            .create_user(&user, &hash)
            .expect("create staff");
        self.token_for(email, PASSWORD).await
    }

    pub fn add_vehicle(&self, name: &str, price: i64, quantity: i64) -> Vehicle {
        let vehicle = NewVehicle {
            name: name.to_string(),
            brand: "VinFast".to_string(),
            vehicle_type: VehicleType::Car,
            price,
            year: 2024,
            description: format!("{name} description"),
            image: "/images/placeholder.jpg".to_string(),
            quantity,
        };
        self.state
            .storage()
            .expect("storage")
            .insert_vehicle(&vehicle)
            .expect("insert vehicle")
    }

    pub fn stock_of(&self, vehicle_id: i64) -> i64 {
        self.state
            .storage()
            .expect("storage")
            .get_vehicle(vehicle_id)
            .expect("get vehicle")
            .expect("vehicle exists")
            .quantity
    }
}

pub fn shipping_info() -> Value {
    json!({
        "address": "12 Lê Lợi",
        "city": "Huế",
        "phoneNo": "0900000000",
        "postalCode": "530000"
    })
}
