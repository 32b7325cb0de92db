//! The command shell: parse a command line, run it against the session, report.

mod execute;
mod output;

pub use execute::{execute, Outcome, Report};
pub use output::print_report;

use serde_json::Value;
use thiserror::Error;

use crate::models::{Registration, Role};

pub const USAGE: &str = r#"usage: lmsportal [--schema] <command> [args]

session:
  login <email> <password>
  google-login <id-token>
  register <email> <password> <first-name> <last-name> [student|admin]
  logout
  whoami
  visit <path>

student:
  courses | course <id> | enroll <course-id> | enrollments
  assignments [upcoming] | assignment <id> | submit <assignment-id> <content>

admin:
  stats
  create-course <json> | edit-course <id> <json> | delete-course <id>
  create-assignment <json> | delete-assignment <id>
  submissions <assignment-id> | grade <submission-id> <points> [feedback]

<json> is a single argument holding a JSON object, e.g. '{"title": "Rust"}'."#;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { email: String, password: String },
    GoogleLogin { token: String },
    Register(Registration),
    Logout,
    WhoAmI,
    Visit { path: String },
    Courses,
    Course { id: String },
    Enroll { course_id: String },
    Enrollments,
    Assignments { upcoming: bool },
    Assignment { id: String },
    Submit { assignment_id: String, content: String },
    Submissions { assignment_id: String },
    Grade {
        submission_id: String,
        points: f64,
        feedback: Option<String>,
    },
    Stats,
    CreateCourse { course: Value },
    EditCourse { id: String, changes: Value },
    DeleteCourse { id: String },
    CreateAssignment { assignment: Value },
    DeleteAssignment { id: String },
    Help,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("missing argument <{0}>")]
    MissingArgument(&'static str),
    #[error("invalid value '{value}' for <{name}>")]
    InvalidArgument { name: &'static str, value: String },
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

struct Args<I: Iterator<Item = String>> {
    inner: I,
}

impl<I: Iterator<Item = String>> Args<I> {
    fn required(&mut self, name: &'static str) -> Result<String, ParseError> {
        self.inner.next().ok_or(ParseError::MissingArgument(name))
    }

    fn optional(&mut self) -> Option<String> {
        self.inner.next()
    }

    fn finish(mut self) -> Result<(), ParseError> {
        match self.inner.next() {
            Some(extra) => Err(ParseError::UnexpectedArgument(extra)),
            None => Ok(()),
        }
    }
}

impl Command {
    /// Parse the arguments that follow the program name (and any global flags).
    pub fn parse<I>(args: I) -> Result<Command, ParseError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = Args {
            inner: args.into_iter(),
        };
        let Some(name) = args.optional() else {
            return Ok(Command::Help);
        };

        let command = match name.as_str() {
            "login" => Command::Login {
                email: args.required("email")?,
                password: args.required("password")?,
            },
            "google-login" => Command::GoogleLogin {
                token: args.required("id-token")?,
            },
            "register" => {
                let email = args.required("email")?;
                let password = args.required("password")?;
                let first_name = args.required("first-name")?;
                let last_name = args.required("last-name")?;
                let role = match args.optional() {
                    None => Role::default(),
                    Some(value) => parse_role(&value)?,
                };
                Command::Register(Registration {
                    email,
                    password,
                    role,
                    first_name,
                    last_name,
                })
            }
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "visit" => Command::Visit {
                path: args.required("path")?,
            },
            "courses" => Command::Courses,
            "course" => Command::Course {
                id: args.required("id")?,
            },
            "enroll" => Command::Enroll {
                course_id: args.required("course-id")?,
            },
            "enrollments" => Command::Enrollments,
            "assignments" => match args.optional() {
                None => Command::Assignments { upcoming: false },
                Some(flag) if flag == "upcoming" => Command::Assignments { upcoming: true },
                Some(other) => return Err(ParseError::UnexpectedArgument(other)),
            },
            "assignment" => Command::Assignment {
                id: args.required("id")?,
            },
            "submit" => Command::Submit {
                assignment_id: args.required("assignment-id")?,
                content: args.required("content")?,
            },
            "submissions" => Command::Submissions {
                assignment_id: args.required("assignment-id")?,
            },
            "grade" => {
                let submission_id = args.required("submission-id")?;
                let raw = args.required("points")?;
                let points = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|p| p.is_finite() && *p >= 0.0)
                    .ok_or(ParseError::InvalidArgument {
                        name: "points",
                        value: raw,
                    })?;
                Command::Grade {
                    submission_id,
                    points,
                    feedback: args.optional(),
                }
            }
            "stats" => Command::Stats,
            "create-course" => Command::CreateCourse {
                course: json_object(args.required("json")?)?,
            },
            "edit-course" => Command::EditCourse {
                id: args.required("id")?,
                changes: json_object(args.required("json")?)?,
            },
            "delete-course" => Command::DeleteCourse {
                id: args.required("id")?,
            },
            "create-assignment" => Command::CreateAssignment {
                assignment: json_object(args.required("json")?)?,
            },
            "delete-assignment" => Command::DeleteAssignment {
                id: args.required("id")?,
            },
            "help" | "--help" | "-h" => Command::Help,
            other => return Err(ParseError::UnknownCommand(other.to_string())),
        };
        args.finish()?;
        Ok(command)
    }

    /// Name used in logs. Never includes arguments, which may be secrets.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login { .. } => "login",
            Command::GoogleLogin { .. } => "google-login",
            Command::Register(_) => "register",
            Command::Logout => "logout",
            Command::WhoAmI => "whoami",
            Command::Visit { .. } => "visit",
            Command::Courses => "courses",
            Command::Course { .. } => "course",
            Command::Enroll { .. } => "enroll",
            Command::Enrollments => "enrollments",
            Command::Assignments { .. } => "assignments",
            Command::Assignment { .. } => "assignment",
            Command::Submit { .. } => "submit",
            Command::Submissions { .. } => "submissions",
            Command::Grade { .. } => "grade",
            Command::Stats => "stats",
            Command::CreateCourse { .. } => "create-course",
            Command::EditCourse { .. } => "edit-course",
            Command::DeleteCourse { .. } => "delete-course",
            Command::CreateAssignment { .. } => "create-assignment",
            Command::DeleteAssignment { .. } => "delete-assignment",
            Command::Help => "help",
        }
    }

    /// Whether running this command needs configuration and a resolved session.
    pub fn needs_session(&self) -> bool {
        !matches!(self, Command::Help)
    }
}

fn json_object(raw: String) -> Result<Value, ParseError> {
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) if value.is_object() => Ok(value),
        _ => Err(ParseError::InvalidArgument {
            name: "json",
            value: raw,
        }),
    }
}

fn parse_role(value: &str) -> Result<Role, ParseError> {
    match value.to_lowercase().as_str() {
        "student" => Ok(Role::Student),
        "admin" => Ok(Role::Admin),
        _ => Err(ParseError::InvalidArgument {
            name: "role",
            value: value.to_string(),
        }),
    }
}
