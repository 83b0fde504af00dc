//! Session commands: login, logout, register, whoami.

use clap::Args;
use fitsupply_client::{Registration, SessionPhase, Store};

use super::{CommandError, emit, secret_or_stdin};

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(short, long)]
    username: String,

    #[arg(short, long)]
    email: String,

    #[arg(long, default_value = "")]
    first_name: String,

    #[arg(long, default_value = "")]
    last_name: String,

    /// Read from stdin when omitted
    #[arg(short, long)]
    password: Option<String>,

    /// Defaults to the password when omitted
    #[arg(long)]
    password_confirm: Option<String>,
}

pub async fn login(
    store: &Store,
    username: &str,
    password: Option<String>,
) -> Result<(), CommandError> {
    let password = secret_or_stdin(password, "password")?;
    let user = store.sign_in(username, &password).await?;
    emit(&[
        format!("Signed in as {}", user.display_name()),
        format!("Cart: {} item(s)", store.cart().item_count()),
    ])
}

pub fn logged_out() -> Result<(), CommandError> {
    emit(&["Signed out".to_string()])
}

pub async fn register(store: &Store, args: RegisterArgs) -> Result<(), CommandError> {
    let password = secret_or_stdin(args.password.clone(), "password")?;
    let password_confirm = match args.password_confirm {
        Some(confirm) => confirm.into(),
        None => password.clone(),
    };
    let form = Registration {
        username: args.username,
        email: args.email,
        password,
        password_confirm,
        first_name: args.first_name,
        last_name: args.last_name,
    };

    let user = store.auth().register_and_login(&form).await?;
    if let Err(e) = store.cart().fetch_remote().await {
        tracing::warn!(error = %e, "Could not load server cart after registration");
    }
    emit(&[format!("Welcome, {}! Your account is ready.", user.display_name())])
}

pub fn whoami(store: &Store) -> Result<(), CommandError> {
    let state = store.auth().snapshot();
    let lines = match (state.phase(), state.user) {
        (SessionPhase::Identified, Some(user)) => {
            let mut lines = vec![
                format!("{} ({})", user.display_name(), user.username),
                format!("Email: {}", user.email),
            ];
            if user.is_staff {
                lines.push("Role: staff".to_string());
            }
            lines
        }
        _ => vec!["Not signed in".to_string()],
    };
    emit(&lines)
}
