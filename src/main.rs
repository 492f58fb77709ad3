use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Report, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use gymdesk::gym::types::{
  ChangePasswordPayload, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest,
  VerifyOtpRequest,
};
use gymdesk::query::{Query, QueryState};
use gymdesk::storage::{ClientStorage, SqliteStorage};
use gymdesk::{logging, ApiError, Config, GymClient};

#[derive(Parser, Debug)]
#[command(name = "gymdesk")]
#[command(about = "Command-line client for the GymDesk gym-owner dashboard")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/gymdesk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Sign in with email and password
  Login {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
  },
  /// Complete a login that asked for an emailed OTP
  VerifyOtp {
    #[arg(long)]
    email: String,
    #[arg(long)]
    otp: String,
  },
  /// Request a password reset OTP
  ForgotPassword {
    #[arg(long)]
    email: String,
  },
  /// Set a new password using a reset OTP
  ResetPassword {
    #[arg(long)]
    email: String,
    #[arg(long)]
    otp: String,
    #[arg(long)]
    new_password: String,
  },
  /// Forget the stored session
  Logout,
  /// Show the signed-in owner's profile
  Profile,
  /// Change the signed-in owner's password
  ChangePassword {
    #[arg(long)]
    current: String,
    #[arg(long)]
    new: String,
  },
  /// List members (defaults to the selected location)
  Members {
    #[arg(short, long)]
    location: Option<String>,
  },
  /// List membership plans (defaults to the selected location)
  Plans {
    #[arg(short, long)]
    location: Option<String>,
  },
  /// List gym locations
  Locations,
  /// Manage the persisted location filter
  Location {
    #[command(subcommand)]
    action: LocationAction,
  },
  /// List compliance documents
  Documents,
  /// Show the approval state of the gym registration
  RegistrationStatus,
}

#[derive(Subcommand, Debug)]
enum LocationAction {
  /// Remember a location id for later commands
  Select { id: String },
  /// Forget the selected location
  Clear,
  /// Show the selected location
  Show,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Logging is best effort; the command still runs without it
  let _log_guard = match logging::init() {
    Ok(guard) => Some(guard),
    Err(e) => {
      eprintln!("warning: file logging disabled: {}", e);
      None
    }
  };

  let config = Config::load(args.config.as_deref())?;
  let storage: Arc<dyn ClientStorage> = Arc::new(SqliteStorage::open(&config.storage_path()?)?);
  let gym = GymClient::new(&config, storage)?;

  run(&gym, args.command).await
}

async fn run(gym: &GymClient, command: Command) -> Result<()> {
  match command {
    Command::Login { email, password } => {
      let response = gym
        .login(&LoginRequest { email, password })
        .await
        .map_err(explain)?;

      if response.requires_otp || response.token.is_none() {
        let message = response
          .message
          .unwrap_or_else(|| "OTP sent to your email".to_string());
        println!("{}. Run `gymdesk verify-otp` to finish signing in.", message);
      } else {
        println!("Signed in.");
      }
    }
    Command::VerifyOtp { email, otp } => {
      gym
        .verify_otp(&VerifyOtpRequest { email, otp })
        .await
        .map_err(explain)?;
      println!("Signed in.");
    }
    Command::ForgotPassword { email } => {
      let response = gym
        .forgot_password(&ForgotPasswordRequest { email })
        .await
        .map_err(explain)?;
      print_json(&response)?;
    }
    Command::ResetPassword {
      email,
      otp,
      new_password,
    } => {
      let response = gym
        .reset_password(&ResetPasswordRequest {
          email,
          otp,
          new_password,
        })
        .await
        .map_err(explain)?;
      print_json(&response)?;
    }
    Command::Logout => {
      gym.logout().map_err(explain)?;
      println!("Signed out.");
    }
    Command::Profile => show(gym.profile_query()).await?,
    Command::ChangePassword { current, new } => {
      let response = gym
        .change_password(&ChangePasswordPayload {
          current_password: current,
          new_password: new,
        })
        .await
        .map_err(explain)?;
      print_json(&response)?;
    }
    Command::Members { location } => {
      let location = location_or_selected(gym, location)?;
      show(gym.members_query(location)).await?
    }
    Command::Plans { location } => {
      let location = location_or_selected(gym, location)?;
      show(gym.membership_plans_query(location)).await?
    }
    Command::Locations => show(gym.locations_query()).await?,
    Command::Location { action } => match action {
      LocationAction::Select { id } => {
        gym.locations_store().select(&id)?;
        println!("Selected location {}.", id);
      }
      LocationAction::Clear => {
        gym.locations_store().clear()?;
        println!("Cleared selected location.");
      }
      LocationAction::Show => match gym.selected_location().await.map_err(explain)? {
        Some(location) => print_json(&location)?,
        None => println!("No location selected."),
      },
    },
    Command::Documents => show(gym.documents_query()).await?,
    Command::RegistrationStatus => show(gym.registration_status_query()).await?,
  }

  Ok(())
}

fn location_or_selected(gym: &GymClient, explicit: Option<String>) -> Result<Option<String>> {
  match explicit {
    Some(id) => Ok(Some(id)),
    None => gym.locations_store().selected(),
  }
}

/// Drive a query to completion and print its data.
async fn show<T: Serialize + Send + 'static>(mut query: Query<T>) -> Result<()> {
  query.fetch();
  match query.settle().await {
    QueryState::Success(data) => print_json(data),
    QueryState::Error(e) => Err(explain(e.clone())),
    QueryState::Idle | QueryState::Loading => Err(eyre!("query did not complete")),
  }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn explain(err: ApiError) -> Report {
  if err.is_unauthorized() {
    eyre!("{}\nYour session has expired. Run `gymdesk login` to sign in again.", err)
  } else {
    Report::new(err)
  }
}
