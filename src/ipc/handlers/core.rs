use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let identity = state.setup.identity();
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "passwordLength": identity.password_length,
            "usernamePadChar": identity.pad_char.to_string()
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        _ => None,
    }
}
