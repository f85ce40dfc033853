//! In-process stand-in for a Web-Base installation and a database engine.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use webbase_tester::provision::{DatabaseEngine, CONFIG_FILES};
use webbase_tester::utils::config::DbmsKind;
use webbase_tester::HarnessResult;

const SESSION_COOKIE: &str = "session";
const LEAKED_NOTICE: &str = "<br />\n<b>Notice</b>:  Undefined index: user in <b>/var/www/core/Api/Notifications.class.php</b> on line <b>12</b><br />";

/// Misbehaviours the fake application can be told to show
#[derive(Debug, Clone, Default)]
pub struct Faults {
    pub leak_notice_on_notifications: bool,
    pub refresh_moves_backwards: bool,
    pub logout_always_succeeds: bool,
    pub create_key_server_error: bool,
    pub relogin_without_message: bool,
    pub accept_short_passwords: bool,
    pub accept_any_username_length: bool,
    pub accept_mismatched_passwords: bool,
    pub accept_any_email: bool,
    pub list_keys_with_id_field: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Database,
    User,
    Mail,
    Finished,
}

#[derive(Debug)]
pub struct AppState {
    pub stage: Stage,
    pub submitted_database: Option<HashMap<String, String>>,
    pub admin: Option<(String, String)>,
    pub sessions: HashMap<String, bool>,
    pub next_session: u32,
    pub api_keys: Vec<Value>,
    pub next_key: u64,
    pub requests: Vec<String>,
}

pub struct FakeWebBase {
    pub state: Mutex<AppState>,
    faults: Faults,
    app_root: PathBuf,
}

impl FakeWebBase {
    /// Serve a fresh, uninstalled application on an ephemeral port.
    /// Returns the base URL and a handle to inspect its state.
    pub async fn start(faults: Faults, app_root: PathBuf) -> (String, Arc<FakeWebBase>) {
        let app = Arc::new(FakeWebBase {
            state: Mutex::new(AppState {
                stage: Stage::Database,
                submitted_database: None,
                admin: None,
                sessions: HashMap::new(),
                next_session: 1,
                api_keys: Vec::new(),
                next_key: 1,
                requests: Vec::new(),
            }),
            faults,
            app_root,
        });

        let router = Router::new()
            .route("/", get(install_page).post(install_submit))
            .route("/api/*method", post(api))
            .with_state(app.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        (format!("http://{}/", addr), app)
    }

    pub fn stage(&self) -> Stage {
        self.state.lock().unwrap().stage
    }

    pub fn submitted_database_name(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .submitted_database
            .as_ref()
            .and_then(|form| form.get("database").cloned())
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    fn write_config(&self, index: usize) {
        let path = self.app_root.join(CONFIG_FILES[index]);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "<?php\n").unwrap();
    }
}

fn result(success: bool, msg: &str) -> Value {
    json!({ "success": success, "msg": msg })
}

async fn install_page(State(app): State<Arc<FakeWebBase>>) -> Html<String> {
    let mut state = app.state.lock().unwrap();
    state.requests.push("GET /".to_string());
    let body = match state.stage {
        Stage::Finished => "<html><body>Installation finished, you can now customize your own website.</body></html>".to_string(),
        stage => format!("<html><body>Installation step: {:?}</body></html>", stage),
    };
    Html(body)
}

async fn install_submit(
    State(app): State<Arc<FakeWebBase>>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    let mut state = app.state.lock().unwrap();
    state.requests.push("POST /".to_string());
    let param = |name: &str| form.get(name).map(String::as_str).unwrap_or("");

    let response = match state.stage {
        Stage::Database => {
            let missing = ["host", "port", "username", "database", "type"]
                .iter()
                .any(|f| param(f).is_empty());
            if missing || !form.contains_key("password") {
                result(false, "Please fill out the following inputs")
            } else if !["mysql", "postgres"].contains(&param("type")) {
                result(false, "Unsupported database type. Must be one of: mysql, postgres")
            } else {
                state.submitted_database = Some(form.clone());
                state.stage = Stage::User;
                app.write_config(0);
                result(true, "")
            }
        }
        Stage::User => {
            let (username, password, confirm) =
                (param("username"), param("password"), param("confirmPassword"));
            if username.is_empty() || password.is_empty() || confirm.is_empty() {
                result(false, "Please fill out the following inputs")
            } else if (username.len() < 5 || username.len() > 32)
                && !app.faults.accept_any_username_length
            {
                result(false, "The username should be between 5 and 32 characters long")
            } else if password != confirm && !app.faults.accept_mismatched_passwords {
                result(false, "The given passwords do not match")
            } else if password.len() < 6 && !app.faults.accept_short_passwords {
                result(false, "The password should be at least 6 characters long")
            } else if form.get("email").is_some_and(|e| !e.contains('@'))
                && !app.faults.accept_any_email
            {
                result(false, "Invalid email address")
            } else {
                state.admin = Some((username.to_string(), password.to_string()));
                state.stage = Stage::Mail;
                app.write_config(1);
                result(true, "")
            }
        }
        Stage::Mail => {
            if param("skip") == "true" {
                state.stage = Stage::Finished;
                app.write_config(2);
                result(true, "")
            } else {
                result(false, "Please fill out the following inputs")
            }
        }
        Stage::Finished => result(false, "Already installed"),
    };
    Json(response)
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

async fn api(
    State(app): State<Arc<FakeWebBase>>,
    Path(method): Path<String>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut state = app.state.lock().unwrap();
    let method = method.trim_start_matches('/').to_string();
    state.requests.push(format!("POST /api/{}", method));

    let session = session_id(&headers);
    let logged_in = session
        .as_ref()
        .and_then(|id| state.sessions.get(id))
        .copied()
        .unwrap_or(false);

    if method == "user/login" {
        if logged_in {
            let msg = if app.faults.relogin_without_message {
                ""
            } else {
                "You are already logged in"
            };
            return Json(result(true, msg)).into_response();
        }
        let valid = state.admin.as_ref().is_some_and(|(user, pass)| {
            form.get("username") == Some(user) && form.get("password") == Some(pass)
        });
        if !valid {
            return Json(result(false, "Wrong username or password")).into_response();
        }
        let id = format!("s{}", state.next_session);
        state.next_session += 1;
        state.sessions.insert(id.clone(), true);
        let cookie = format!("{}={}; Path=/", SESSION_COOKIE, id);
        return ([(header::SET_COOKIE, cookie)], Json(result(true, ""))).into_response();
    }

    if method == "user/logout" {
        if app.faults.logout_always_succeeds {
            return Json(result(true, "")).into_response();
        }
        return match session {
            Some(id) if logged_in => {
                state.sessions.remove(&id);
                Json(result(true, "")).into_response()
            }
            _ => Json(result(false, "You are not logged in")).into_response(),
        };
    }

    if !logged_in {
        return Json(result(false, "You are not logged in")).into_response();
    }

    match method.as_str() {
        "apiKey/fetch" => {
            let mut keys = state.api_keys.clone();
            if app.faults.list_keys_with_id_field {
                for key in keys.iter_mut().filter_map(Value::as_object_mut) {
                    if let Some(uid) = key.remove("uid") {
                        key.insert("id".to_string(), uid);
                    }
                }
            }
            Json(json!({ "success": true, "msg": "", "api_keys": keys })).into_response()
        }
        "apiKey/create" => {
            if app.faults.create_key_server_error {
                return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
            }
            let uid = state.next_key;
            state.next_key += 1;
            let key = json!({
                "uid": uid,
                "api_key": format!("key{:032}", uid),
                "valid_until": 1_800_000_000u64 + uid,
            });
            state.api_keys.push(key.clone());
            Json(json!({ "success": true, "msg": "", "api_key": key })).into_response()
        }
        "apiKey/refresh" => {
            let backwards = app.faults.refresh_moves_backwards;
            let id = form.get("id").cloned().unwrap_or_default();
            match state
                .api_keys
                .iter_mut()
                .find(|k| k["uid"].to_string() == id)
            {
                Some(key) => {
                    let current = key["valid_until"].as_u64().unwrap();
                    let next = if backwards { current - 60 } else { current + 3600 };
                    key["valid_until"] = json!(next);
                    Json(json!({ "success": true, "msg": "", "valid_until": next })).into_response()
                }
                None => Json(result(false, "This API-Key does not exist")).into_response(),
            }
        }
        "apiKey/revoke" => {
            let id = form.get("id").cloned().unwrap_or_default();
            let before = state.api_keys.len();
            state.api_keys.retain(|k| k["uid"].to_string() != id);
            let removed = state.api_keys.len() < before;
            Json(result(removed, if removed { "" } else { "This API-Key does not exist" }))
                .into_response()
        }
        "notifications/fetch" => {
            let body = json!({ "success": true, "msg": "", "notifications": [] }).to_string();
            if app.faults.leak_notice_on_notifications {
                Html(format!("{}\n{}", LEAKED_NOTICE, body)).into_response()
            } else {
                Html(body).into_response()
            }
        }
        _ => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

/// Database engine that only records what it was asked to do
#[derive(Clone, Default)]
pub struct FakeEngine {
    pub log: Arc<Mutex<Vec<String>>>,
    pub fail_connect: bool,
    pub fail_create: bool,
    pub fail_drop: bool,
}

impl FakeEngine {
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.log.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DatabaseEngine for FakeEngine {
    fn kind(&self) -> DbmsKind {
        DbmsKind::Mysql
    }

    async fn connect(&mut self) -> HarnessResult<()> {
        if self.fail_connect {
            return Err(webbase_tester::HarnessError::provisioning("connection refused"));
        }
        self.record("connect".to_string());
        Ok(())
    }

    async fn create_database(&mut self, name: &str) -> HarnessResult<()> {
        if self.fail_create {
            return Err(webbase_tester::HarnessError::provisioning("access denied"));
        }
        self.record(format!("create {}", name));
        Ok(())
    }

    async fn drop_database(&mut self, name: &str) -> HarnessResult<()> {
        if self.fail_drop {
            return Err(webbase_tester::HarnessError::provisioning("database is in use"));
        }
        self.record(format!("drop {}", name));
        Ok(())
    }

    async fn close(&mut self) -> HarnessResult<()> {
        self.record("close".to_string());
        Ok(())
    }
}
