use std::future::Future;

use serde_json::{json, Value};
use tracing::info;

use super::{Command, USAGE};
use crate::api::{admin, assignments, courses, enrollments};
use crate::guard::{GuardDecision, LOGIN_PATH};
use crate::models::Role;
use crate::session::LoginResult;
use crate::state::AppState;
use crate::transport::ApiError;

/// What a command came to.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Data returned by the backend.
    Data(Value),
    Message(String),
    /// The guard (or a lost credential) sent the user elsewhere.
    Redirected(String),
    /// The session was still resolving.
    Loading,
    Failed(String),
}

impl From<Value> for Outcome {
    fn from(body: Value) -> Self {
        Outcome::Data(body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub command: &'static str,
    pub outcome: Outcome,
    /// Where the navigator ended up.
    pub location: String,
}

/// Run one command against the shared state.
///
/// Failures are reported in the [`Report`], never raised: each page handles its
/// own errors.
pub async fn execute(state: &AppState, command: Command) -> Report {
    let name = command.name();
    let outcome = run(state, command).await;
    info!(
        event_name = "command.executed",
        event_domain = "commands",
        command = name,
        outcome = outcome_name(&outcome),
        "command finished"
    );
    Report {
        command: name,
        outcome,
        location: state.location(),
    }
}

fn outcome_name(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Data(_) | Outcome::Message(_) => "ok",
        Outcome::Redirected(_) => "redirected",
        Outcome::Loading => "loading",
        Outcome::Failed(_) => "failed",
    }
}

async fn run(state: &AppState, command: Command) -> Outcome {
    match command {
        Command::Help => Outcome::Message(USAGE.to_string()),
        Command::Login { email, password } => {
            let result = state.session.login(&email, &password).await;
            signed_in(state, result)
        }
        Command::GoogleLogin { token } => {
            let result = state.session.login_with_federated_token(&token).await;
            signed_in(state, result)
        }
        Command::Register(registration) => {
            let result = state.session.register(&registration).await;
            signed_in(state, result)
        }
        Command::Logout => {
            state.session.logout();
            state.navigator.navigate(LOGIN_PATH);
            Outcome::Message("Logged out.".to_string())
        }
        Command::WhoAmI => match state.session.identity() {
            Some(identity) => Outcome::Data(json!(identity)),
            None => Outcome::Message("Not logged in.".to_string()),
        },
        Command::Visit { path } => match state.visit(&path) {
            GuardDecision::Render(_) => Outcome::Message(format!("Showing {}", path)),
            GuardDecision::Redirect(to) => Outcome::Redirected(to),
            GuardDecision::Loading => Outcome::Loading,
        },
        Command::Courses => {
            let page = by_role(state, "/student/courses", "/admin/courses");
            on_page(state, page, "Failed to load courses.", courses::list(&state.client)).await
        }
        Command::Course { id } => {
            let page = by_role(
                state,
                &format!("/student/courses/{}", id),
                &format!("/admin/courses/{}/edit", id),
            );
            on_page(state, page, "Failed to load course details.", courses::get(&state.client, &id))
                .await
        }
        Command::Enroll { course_id } => {
            on_page(
                state,
                "/student/courses".to_string(),
                "Failed to enroll in course. Please try again.",
                enrollments::enroll(&state.client, &course_id),
            )
            .await
        }
        Command::Enrollments => {
            on_page(
                state,
                "/student/dashboard".to_string(),
                "Failed to load enrolled courses.",
                enrollments::mine(&state.client),
            )
            .await
        }
        Command::Assignments { upcoming } => {
            let admin = role_of(state) == Some(Role::Admin);
            let page = if admin {
                "/admin/assignments".to_string()
            } else if upcoming {
                "/student/dashboard".to_string()
            } else {
                "/student/assignments".to_string()
            };
            let fallback = "Failed to load assignments.";
            if admin {
                on_page(state, page, fallback, assignments::for_admin(&state.client)).await
            } else if upcoming {
                on_page(state, page, fallback, assignments::upcoming(&state.client)).await
            } else {
                on_page(state, page, fallback, assignments::for_student(&state.client)).await
            }
        }
        Command::Assignment { id } => {
            let page = by_role(
                state,
                &format!("/student/assignments/{}", id),
                &format!("/admin/assignments/{}/grade", id),
            );
            on_page(state, page, "Failed to load assignment.", assignments::get(&state.client, &id))
                .await
        }
        Command::Submit {
            assignment_id,
            content,
        } => {
            let page = format!("/student/assignments/{}", assignment_id);
            on_page(
                state,
                page,
                "Failed to submit assignment. Please try again.",
                submit_or_update(state, &assignment_id, &content),
            )
            .await
        }
        Command::Submissions { assignment_id } => {
            let page = format!("/admin/assignments/{}/grade", assignment_id);
            on_page(
                state,
                page,
                "Failed to load submissions.",
                assignments::submissions(&state.client, &assignment_id),
            )
            .await
        }
        Command::Grade {
            submission_id,
            points,
            feedback,
        } => {
            on_page(
                state,
                "/admin/assignments".to_string(),
                "Failed to save grade. Please try again.",
                assignments::grade(&state.client, &submission_id, points, feedback.as_deref()),
            )
            .await
        }
        Command::Stats => {
            on_page(
                state,
                "/admin/dashboard".to_string(),
                "Failed to load dashboard statistics.",
                admin::dashboard_stats(&state.client),
            )
            .await
        }
        Command::CreateCourse { course } => {
            on_page(
                state,
                "/admin/courses/create".to_string(),
                "Failed to create course. Please try again.",
                courses::create(&state.client, &course),
            )
            .await
        }
        Command::EditCourse { id, changes } => {
            on_page(
                state,
                format!("/admin/courses/{}/edit", id),
                "Failed to update course. Please try again.",
                courses::update(&state.client, &id, &changes),
            )
            .await
        }
        Command::DeleteCourse { id } => {
            let deleted = async {
                courses::delete(&state.client, &id).await?;
                Ok::<_, ApiError>(Outcome::Message(format!("Deleted course {}.", id)))
            };
            on_page(
                state,
                "/admin/courses".to_string(),
                "Failed to delete course. Please try again.",
                deleted,
            )
            .await
        }
        Command::CreateAssignment { assignment } => {
            on_page(
                state,
                "/admin/assignments/create".to_string(),
                "Failed to create assignment. Please try again.",
                assignments::create(&state.client, &assignment),
            )
            .await
        }
        Command::DeleteAssignment { id } => {
            let deleted = async {
                assignments::delete(&state.client, &id).await?;
                Ok::<_, ApiError>(Outcome::Message(format!("Deleted assignment {}.", id)))
            };
            on_page(
                state,
                "/admin/assignments".to_string(),
                "Failed to delete assignment. Please try again.",
                deleted,
            )
            .await
        }
    }
}

/// After any sign-in flow: go to the granted role's home, or report the failure.
fn signed_in(state: &AppState, result: LoginResult) -> Outcome {
    match result {
        Ok(role) => {
            state.navigator.navigate(role.home_path());
            Outcome::Message(format!("Signed in as {}.", role))
        }
        Err(failure) => Outcome::Failed(failure.message),
    }
}

fn role_of(state: &AppState) -> Option<Role> {
    state.session.identity().map(|identity| identity.role)
}

fn by_role(state: &AppState, student_page: &str, admin_page: &str) -> String {
    match role_of(state) {
        Some(Role::Admin) => admin_page.to_string(),
        _ => student_page.to_string(),
    }
}

/// Enter `page` through the guard and, if it renders, run its data call.
///
/// The call is only awaited once the guard lets the user in, so a redirect never
/// touches the backend.
async fn on_page<F, T>(state: &AppState, page: String, fallback: &str, call: F) -> Outcome
where
    F: Future<Output = Result<T, ApiError>>,
    T: Into<Outcome>,
{
    match state.visit(&page) {
        GuardDecision::Loading => return Outcome::Loading,
        GuardDecision::Redirect(to) => return Outcome::Redirected(to),
        GuardDecision::Render(_) => {}
    }

    match call.await {
        Ok(done) => done.into(),
        // The navigator has already been sent to the login page.
        Err(e) if e.is_unauthorized() => Outcome::Redirected(state.location()),
        Err(e) => Outcome::Failed(failure_message(&e, fallback)),
    }
}

/// Input rejected locally explains itself; otherwise prefer the backend's detail.
fn failure_message(err: &ApiError, fallback: &str) -> String {
    if err.is_input_error() {
        return err.to_string();
    }
    err.detail().unwrap_or(fallback).to_string()
}

/// Update the student's existing submission, or create one if there is none yet.
async fn submit_or_update(state: &AppState, assignment_id: &str, content: &str) -> Result<Value, ApiError> {
    match assignments::my_submission(&state.client, assignment_id).await {
        Ok(existing) => match existing_submission_id(&existing) {
            Some(id) => {
                assignments::update_submission(&state.client, id, assignment_id, content).await
            }
            None => assignments::submit(&state.client, assignment_id, content).await,
        },
        Err(ApiError::NotFound { .. }) => {
            assignments::submit(&state.client, assignment_id, content).await
        }
        Err(e) => Err(e),
    }
}

/// Id of a submission the student already made, from `GET /assignments/{id}/submission`.
///
/// The backend answers `{"submitted": false, ...}` when there is none yet, and
/// `{"submitted": true, "submission_id": ...}` when there is.
fn existing_submission_id(status: &Value) -> Option<&str> {
    if status.get("submitted").and_then(Value::as_bool) == Some(false) {
        return None;
    }
    status
        .get("submission_id")
        .or_else(|| status.get("id"))
        .and_then(Value::as_str)
}
