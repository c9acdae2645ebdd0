use crate::identity::{
    self, AccountRecord, Credential, DraftField, PersonDraft, PersonKind,
};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{optional_usize, param_text, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::debug;

fn parse_draft(req: &Request) -> Result<PersonDraft, serde_json::Value> {
    let Some(raw) = req.params.get("draft") else {
        return Err(err(&req.id, "bad_params", "missing draft", None));
    };
    serde_json::from_value(raw.clone()).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("draft is not a person draft: {}", e),
            None,
        )
    })
}

fn draft_json(req: &Request, draft: &PersonDraft) -> Result<serde_json::Value, serde_json::Value> {
    serde_json::to_value(draft)
        .map_err(|e| err(&req.id, "internal", format!("serialize draft: {}", e), None))
}

fn handle_username(state: &mut AppState, req: &Request) -> serde_json::Value {
    let first = param_text(&req.params, "firstName");
    let last = param_text(&req.params, "lastName");
    let username = identity::generate_username(&first, &last, state.setup.identity().pad_char);
    ok(
        &req.id,
        json!({ "username": username, "complete": !username.is_empty() }),
    )
}

fn handle_reference_id(_state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({ "referenceId": identity::generate_reference_id() }),
    )
}

fn handle_password(state: &mut AppState, req: &Request) -> serde_json::Value {
    let length = match optional_usize(
        req,
        "length",
        identity::MIN_PASSWORD_LEN,
        identity::MAX_PASSWORD_LEN,
    ) {
        Ok(v) => v.unwrap_or(state.setup.identity().password_length),
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "password": identity::generate_password(length) }),
    )
}

fn handle_draft_new(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw = match required_str(req, "personType") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(kind) = PersonKind::parse(&raw) else {
        return err(
            &req.id,
            "bad_params",
            "personType must be one of: student, teacher, staff",
            Some(json!({ "personType": raw })),
        );
    };
    debug!(person_type = kind.as_str(), "new person draft");
    match draft_json(req, &PersonDraft::new(kind)) {
        Ok(draft) => ok(&req.id, json!({ "draft": draft })),
        Err(e) => e,
    }
}

fn handle_draft_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let draft = match parse_draft(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let field_raw = param_text(&req.params, "field");
    let value = param_text(&req.params, "value");

    let (next, applied) = match DraftField::parse(field_raw.trim()) {
        Some(field) => {
            let edit = identity::update_draft_field(&draft, field, &value, &state.setup.identity());
            (edit.draft, edit.applied)
        }
        None => (draft, false),
    };
    match draft_json(req, &next) {
        Ok(draft) => ok(&req.id, json!({ "draft": draft, "applied": applied })),
        Err(e) => e,
    }
}

fn handle_draft_regenerate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let draft = match parse_draft(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let raw = match required_str(req, "credential") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(credential) = Credential::parse(&raw) else {
        return err(
            &req.id,
            "bad_params",
            "credential must be one of: referenceId, password",
            Some(json!({ "credential": raw })),
        );
    };
    let next = identity::regenerate(&draft, credential, &state.setup.identity());
    match draft_json(req, &next) {
        Ok(draft) => ok(&req.id, json!({ "draft": draft })),
        Err(e) => e,
    }
}

fn handle_account_finalize(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let draft = match parse_draft(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(account) = draft.account() else {
        return ok(&req.id, json!({ "ready": false }));
    };
    let record = AccountRecord::issue(&account, chrono::Utc::now());
    ok(
        &req.id,
        json!({
            "ready": true,
            "personType": draft.details.kind().as_str(),
            "account": account,
            "record": record
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "identity.username" => Some(handle_username(state, req)),
        "identity.referenceId" => Some(handle_reference_id(state, req)),
        "identity.password" => Some(handle_password(state, req)),
        "identity.draft.new" => Some(handle_draft_new(state, req)),
        "identity.draft.update" => Some(handle_draft_update(state, req)),
        "identity.draft.regenerate" => Some(handle_draft_regenerate(state, req)),
        "identity.account.finalize" => Some(handle_account_finalize(state, req)),
        _ => None,
    }
}
