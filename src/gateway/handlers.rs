//! Route handlers.
//!
//! Each handler loads a [`SessionContext`], does its store/validator
//! calls, and finishes the context into the outgoing cookie jar. The
//! response policy is uniform: authentication and missing-document
//! failures redirect to the index with an error flash; validation
//! failures re-render the originating form with 422 and an inline
//! message; success paths set a success flash and redirect.

use super::pages;
use super::AppState;
use crate::corpus::{content, ContentKind, StoreError};
use crate::session::{Flash, SessionContext};
use crate::validate;
use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

pub const MSG_SIGNIN_REQUIRED: &str = "You must be signed in to do that.";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials.";
const MSG_INTERNAL: &str = "Something went wrong. Please try again.";
const MSG_CHOOSE_IMAGE: &str = "Please choose an image to upload.";

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub uname: String,
    pub psswd: String,
}

#[derive(Debug, Deserialize)]
pub struct NameForm {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ContentForm {
    pub content: String,
}

// ── Response helpers ────────────────────────────────────────────────

/// 302 Found. Clients and tests expect a literal 302 after form posts,
/// so the 303 helper is not used.
fn redirect(ctx: SessionContext, jar: CookieJar, location: &str) -> Response {
    let jar = ctx.finish(jar);
    (
        StatusCode::FOUND,
        jar,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

fn redirect_home_with(mut ctx: SessionContext, jar: CookieJar, flash: Flash) -> Response {
    ctx.set_flash(flash);
    redirect(ctx, jar, "/")
}

fn page(ctx: SessionContext, jar: CookieJar, status: StatusCode, body: String) -> Response {
    let jar = ctx.finish(jar);
    (status, jar, Html(body)).into_response()
}

/// Missing documents redirect with their flash; anything else is logged
/// and surfaced as a generic flash. No 5xx leaves this server.
fn store_failure(ctx: SessionContext, jar: CookieJar, err: StoreError) -> Response {
    match err {
        StoreError::NotFound(_) => redirect_home_with(ctx, jar, Flash::error(err.to_string())),
        StoreError::Io(e) => {
            tracing::error!(error = %e, "corpus i/o failure");
            redirect_home_with(ctx, jar, Flash::error(MSG_INTERNAL))
        }
    }
}

// ── Index & health ──────────────────────────────────────────────────

/// GET /
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);

    let names = state.corpus.list().unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to list corpus");
        Vec::new()
    });

    let flash = ctx.take_flash();
    let body = pages::index(&names, flash.as_ref(), ctx.username());
    page(ctx, jar, StatusCode::OK, body)
}

/// GET /health — liveness probe, no secrets leaked.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let documents = state.corpus.list().map(|names| names.len()).unwrap_or(0);
    Json(serde_json::json!({
        "status": "ok",
        "documents": documents,
    }))
}

// ── Authentication ──────────────────────────────────────────────────

/// GET /users/signin
pub async fn signin_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    let flash = ctx.take_flash();
    let body = pages::signin(None, "", flash.as_ref(), ctx.username());
    page(ctx, jar, StatusCode::OK, body)
}

/// POST /users/signin
pub async fn signin_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    let uname = form.uname.trim();

    if state.credentials.verify(uname, &form.psswd) {
        ctx.sign_in(uname);
        tracing::info!(username = uname, "sign-in");
        return redirect_home_with(ctx, jar, Flash::success("Welcome!"));
    }

    tracing::warn!(username = uname, "failed sign-in");
    let body = pages::signin(Some(MSG_INVALID_CREDENTIALS), uname, None, ctx.username());
    page(ctx, jar, StatusCode::UNPROCESSABLE_ENTITY, body)
}

/// POST /users/signout
pub async fn signout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    ctx.sign_out();
    redirect_home_with(ctx, jar, Flash::success("You have been signed out."))
}

/// GET /users/signup
pub async fn signup_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    let flash = ctx.take_flash();
    let body = pages::signup(None, "", flash.as_ref(), ctx.username());
    page(ctx, jar, StatusCode::OK, body)
}

/// POST /users/signup — creates the account and signs the user in.
pub async fn signup_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    let uname = form.uname.trim();

    match validate::validate_new_account(uname, &form.psswd, &state.credentials) {
        Ok(()) => {
            if let Err(e) = state.credentials.add(uname, &form.psswd) {
                tracing::error!(error = %e, "failed to append credential record");
                return redirect_home_with(ctx, jar, Flash::error(MSG_INTERNAL));
            }
            ctx.sign_in(uname);
            tracing::info!(username = uname, "account created");
            redirect_home_with(
                ctx,
                jar,
                Flash::success("Welcome! Your account has been created."),
            )
        }
        Err(e) => {
            let body = pages::signup(Some(&e.to_string()), uname, None, ctx.username());
            page(ctx, jar, StatusCode::UNPROCESSABLE_ENTITY, body)
        }
    }
}

// ── Document lifecycle ──────────────────────────────────────────────

/// GET /new
pub async fn new_document_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    if !ctx.signed_in() {
        ctx.set_flash(Flash::error(MSG_SIGNIN_REQUIRED));
        return redirect(ctx, jar, "/");
    }

    let flash = ctx.take_flash();
    let body = pages::new_document(None, "", flash.as_ref(), ctx.username());
    page(ctx, jar, StatusCode::OK, body)
}

/// POST /create
pub async fn create_document(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<NameForm>,
) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    if !ctx.signed_in() {
        ctx.set_flash(Flash::error(MSG_SIGNIN_REQUIRED));
        return redirect(ctx, jar, "/");
    }

    let name = form.name.trim();
    match validate::validate_filename(name, &state.corpus) {
        Ok(()) => match state.corpus.write(name, b"") {
            Ok(()) => {
                redirect_home_with(ctx, jar, Flash::success(format!("{name} has been created.")))
            }
            Err(e) => store_failure(ctx, jar, e),
        },
        Err(e) => {
            let body = pages::new_document(Some(&e.to_string()), name, None, ctx.username());
            page(ctx, jar, StatusCode::UNPROCESSABLE_ENTITY, body)
        }
    }
}

/// GET /{filename} — serve a document by its content kind.
pub async fn show_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    jar: CookieJar,
) -> Response {
    let ctx = SessionContext::load(&state.sessions, &jar);

    let bytes = match state.corpus.read(&filename) {
        Ok(bytes) => bytes,
        Err(e) => return store_failure(ctx, jar, e),
    };

    match ContentKind::from_name(&filename) {
        ContentKind::Markdown => {
            let fragment = content::markdown_to_html(&String::from_utf8_lossy(&bytes));
            let body = pages::document(&filename, &fragment, ctx.username());
            page(ctx, jar, StatusCode::OK, body)
        }
        kind => {
            let content_type = kind.content_type(&filename);
            let jar = ctx.finish(jar);
            (jar, [(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
    }
}

/// GET /{filename}/edit
pub async fn edit_form(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    jar: CookieJar,
) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    if !ctx.signed_in() {
        ctx.set_flash(Flash::error(MSG_SIGNIN_REQUIRED));
        return redirect(ctx, jar, "/");
    }

    let bytes = match state.corpus.read(&filename) {
        Ok(bytes) => bytes,
        Err(e) => return store_failure(ctx, jar, e),
    };

    let flash = ctx.take_flash();
    let text = String::from_utf8_lossy(&bytes);
    let body = pages::edit_document(&filename, &text, flash.as_ref(), ctx.username());
    page(ctx, jar, StatusCode::OK, body)
}

/// POST /{filename} — save edited content.
pub async fn update_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    jar: CookieJar,
    Form(form): Form<ContentForm>,
) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    if !ctx.signed_in() {
        ctx.set_flash(Flash::error(MSG_SIGNIN_REQUIRED));
        return redirect(ctx, jar, "/");
    }

    if !state.corpus.contains(&filename) {
        return store_failure(ctx, jar, StoreError::NotFound(filename));
    }

    match state.corpus.write(&filename, form.content.as_bytes()) {
        Ok(()) => redirect_home_with(
            ctx,
            jar,
            Flash::success(format!("{filename} has been updated.")),
        ),
        Err(e) => store_failure(ctx, jar, e),
    }
}

/// POST /{filename}/delete
pub async fn delete_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    jar: CookieJar,
) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    if !ctx.signed_in() {
        ctx.set_flash(Flash::error(MSG_SIGNIN_REQUIRED));
        return redirect(ctx, jar, "/");
    }

    match state.corpus.delete(&filename) {
        Ok(()) => redirect_home_with(
            ctx,
            jar,
            Flash::success(format!("{filename} has been deleted.")),
        ),
        Err(e) => store_failure(ctx, jar, e),
    }
}

/// GET /{filename}/duplicate
pub async fn duplicate_form(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    jar: CookieJar,
) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    if !ctx.signed_in() {
        ctx.set_flash(Flash::error(MSG_SIGNIN_REQUIRED));
        return redirect(ctx, jar, "/");
    }

    if !state.corpus.contains(&filename) {
        return store_failure(ctx, jar, StoreError::NotFound(filename));
    }

    let suggested = format!("copy_of_{filename}");
    let flash = ctx.take_flash();
    let body = pages::duplicate(&filename, &suggested, None, flash.as_ref(), ctx.username());
    page(ctx, jar, StatusCode::OK, body)
}

/// POST /{filename}/duplicate
pub async fn duplicate_submit(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    jar: CookieJar,
    Form(form): Form<NameForm>,
) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    if !ctx.signed_in() {
        ctx.set_flash(Flash::error(MSG_SIGNIN_REQUIRED));
        return redirect(ctx, jar, "/");
    }

    if !state.corpus.contains(&filename) {
        return store_failure(ctx, jar, StoreError::NotFound(filename));
    }

    let dest = form.name.trim();
    match validate::validate_filename(dest, &state.corpus) {
        Ok(()) => match state.corpus.duplicate(&filename, dest) {
            Ok(()) => {
                redirect_home_with(ctx, jar, Flash::success(format!("{dest} has been created.")))
            }
            Err(e) => store_failure(ctx, jar, e),
        },
        Err(e) => {
            let body = pages::duplicate(
                &filename,
                dest,
                Some(&e.to_string()),
                None,
                ctx.username(),
            );
            page(ctx, jar, StatusCode::UNPROCESSABLE_ENTITY, body)
        }
    }
}

// ── Image upload ────────────────────────────────────────────────────

/// GET /upload/image
pub async fn upload_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    if !ctx.signed_in() {
        ctx.set_flash(Flash::error(MSG_SIGNIN_REQUIRED));
        return redirect(ctx, jar, "/");
    }

    let flash = ctx.take_flash();
    let body = pages::upload(None, flash.as_ref(), ctx.username());
    page(ctx, jar, StatusCode::OK, body)
}

/// POST /upload/image — multipart form with an `image` file field.
pub async fn upload_image(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let mut ctx = SessionContext::load(&state.sessions, &jar);
    if !ctx.signed_in() {
        ctx.set_flash(Flash::error(MSG_SIGNIN_REQUIRED));
        return redirect(ctx, jar, "/");
    }

    let mut upload: Option<(String, String, Bytes)> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "malformed multipart body");
                let body = pages::upload(Some(MSG_CHOOSE_IMAGE), None, ctx.username());
                return page(ctx, jar, StatusCode::UNPROCESSABLE_ENTITY, body);
            }
        };
        if field.name() != Some("image") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().trim().to_string();
        let mime = field.content_type().unwrap_or_default().to_string();
        match field.bytes().await {
            Ok(data) => {
                upload = Some((name, mime, data));
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read upload body");
                let body = pages::upload(Some(MSG_CHOOSE_IMAGE), None, ctx.username());
                return page(ctx, jar, StatusCode::UNPROCESSABLE_ENTITY, body);
            }
        }
    }

    let Some((name, mime, data)) = upload else {
        let body = pages::upload(Some(MSG_CHOOSE_IMAGE), None, ctx.username());
        return page(ctx, jar, StatusCode::UNPROCESSABLE_ENTITY, body);
    };

    match validate::validate_image_upload(&name, &mime, &state.corpus) {
        Ok(()) => match state.corpus.write(&name, &data) {
            Ok(()) => {
                redirect_home_with(ctx, jar, Flash::success(format!("{name} has been uploaded.")))
            }
            Err(e) => store_failure(ctx, jar, e),
        },
        Err(e) => {
            let body = pages::upload(Some(&e.to_string()), None, ctx.username());
            page(ctx, jar, StatusCode::UNPROCESSABLE_ENTITY, body)
        }
    }
}
