//! Command handlers.
//!
//! `App` wires the storage, session and API client together once per run.
//! Commands that need a session wait for the startup gate first and bail out
//! with a login hint when it routes to sign-in.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use racha_core::api::ApiError;
use racha_core::auth::{landing_group, wait_for_route};
use racha_core::models::{LoginPayload, RegisterPayload};
use racha_core::utils::{format_brl, truncate_string};
use racha_core::{storage, Config, ExpiryPolicy, HttpAdapter, RachaClient, Route, SessionStore};

/// Widest group name shown in listings
const NAME_WIDTH: usize = 32;

pub struct App {
    session: SessionStore,
    client: RachaClient,
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let store = storage::open(&config).context("Failed to open session storage")?;
        let session = SessionStore::open(store.clone(), &config, ExpiryPolicy::Tracked).await;
        let http = HttpAdapter::new(&config, store).context("Failed to create HTTP client")?;

        Ok(Self {
            session,
            client: RachaClient::new(http),
        })
    }

    /// Stop the session's background work before exit
    pub fn shutdown(&self) {
        self.session.dispose();
    }

    async fn require_session(&self) -> Result<()> {
        match wait_for_route(self.session.subscribe()).await {
            Route::Groups => Ok(()),
            Route::SignIn | Route::Splash => bail!("Not signed in. Run `racha login` first."),
        }
    }

    /// Map an API failure for display; a rejected token ends the session.
    async fn api_failure(&self, err: ApiError) -> anyhow::Error {
        if err.is_unauthorized() {
            warn!(error = %err, "Backend rejected the session");
            self.session.sign_out().await;
            return anyhow::anyhow!("{} (signed out, please log in again)", err);
        }
        err.into()
    }

    // ===== Session =====

    pub async fn status(&self) -> Result<()> {
        let route = wait_for_route(self.session.subscribe()).await;
        let snapshot = self.session.snapshot();
        match route {
            Route::Groups => {
                println!("Signed in");
                if let Some(expires_at) = snapshot.expires_at {
                    let minutes_left = snapshot
                        .time_until_expiry()
                        .map(|d| d.num_minutes())
                        .unwrap_or(0);
                    println!(
                        "Session expires {} ({} min left)",
                        expires_at.format("%Y-%m-%d %H:%M UTC"),
                        minutes_left
                    );
                }
            }
            Route::SignIn | Route::Splash => println!("Signed out"),
        }
        Ok(())
    }

    pub async fn login(&self, email: Option<&str>) -> Result<()> {
        let email = match email {
            Some(email) => email.to_string(),
            None => prompt("Email: ")?,
        };
        let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

        let payload = LoginPayload { email, password };
        self.client.login_and_sign_in(&self.session, &payload).await?;
        println!("Signed in");
        Ok(())
    }

    pub async fn register(&self) -> Result<()> {
        let name = prompt("Name: ")?;
        let email = prompt("Email: ")?;
        let pix_key = prompt("Pix key: ")?;
        let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
        let confirm = rpassword::prompt_password("Confirm password: ")
            .context("Failed to read password")?;
        if password != confirm {
            bail!("Passwords do not match");
        }

        let payload = RegisterPayload {
            name,
            email,
            password,
            pix_key,
        };
        self.client
            .register_and_sign_in(&self.session, &payload)
            .await?;
        println!("Account created, signed in");
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.ready().await;
        self.session.sign_out().await;
        println!("Signed out");
        Ok(())
    }

    // ===== Account and groups =====

    pub async fn whoami(&self) -> Result<()> {
        self.require_session().await?;
        let user = match self.client.get_user().await {
            Ok(user) => user,
            Err(e) => return Err(self.api_failure(e).await),
        };

        println!("{} <{}>", user.name, user.email);
        if let Some(pix_key) = user.pix_key.filter(|k| !k.is_empty()) {
            println!("Pix: {}", pix_key);
        }
        Ok(())
    }

    pub async fn groups(&self) -> Result<()> {
        self.require_session().await?;
        let groups = match self.client.get_groups().await {
            Ok(groups) => groups,
            Err(e) => return Err(self.api_failure(e).await),
        };
        if groups.is_empty() {
            println!("No groups yet. Join one with `racha join <code>`.");
            return Ok(());
        }

        let last_group = self.session.last_group().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read last group");
            None
        });
        let landing = landing_group(&groups, last_group.as_deref()).map(|g| g.id.as_str());

        for group in &groups {
            let marker = if Some(group.id.as_str()) == landing { "*" } else { " " };
            println!(
                "{} {:<width$}  {}",
                marker,
                truncate_string(&group.name, NAME_WIDTH),
                group.id,
                width = NAME_WIDTH
            );
        }
        Ok(())
    }

    pub async fn group(&self, group_id: &str) -> Result<()> {
        self.require_session().await?;

        let (summary, debts, receivables) = futures::join!(
            self.client.get_expense_summary(group_id),
            self.client.get_expense_debts(group_id),
            self.client.get_expense_receivables(group_id),
        );
        let summary = match summary {
            Ok(summary) => summary,
            Err(e) => return Err(self.api_failure(e).await),
        };

        if let Err(e) = self.session.remember_group(group_id).await {
            warn!(error = %e, "Failed to remember group");
        }

        println!("Total spent:   {}", format_brl(summary.total_spent));
        println!("To receive:    {}", format_brl(summary.total_to_receive));
        println!("To pay:        {}", format_brl(summary.total_to_pay));

        match debts {
            Ok(debts) if !debts.debts.is_empty() => {
                println!("\nYou owe:");
                for debt in &debts.debts {
                    let pix = debt.user_pix.as_deref().unwrap_or("-");
                    println!(
                        "  {:<24} {:>14}  pix: {}",
                        truncate_string(&debt.user_name, 24),
                        format_brl(debt.total_amount),
                        pix
                    );
                }
            }
            Ok(_) => {}
            Err(e) => eprintln!("Could not load debts: {}", e),
        }

        match receivables {
            Ok(receivables) if !receivables.is_empty() => {
                println!("\nOwed to you:");
                for receivable in &receivables {
                    println!(
                        "  {:<24} {:>14}",
                        truncate_string(&receivable.payer_name, 24),
                        format_brl(receivable.amount)
                    );
                }
            }
            Ok(_) => {}
            Err(e) => eprintln!("Could not load receivables: {}", e),
        }
        Ok(())
    }

    pub async fn join(&self, code: &str) -> Result<()> {
        self.require_session().await?;
        let joined = match self.client.join_and_remember(&self.session, code).await {
            Ok(joined) => joined,
            Err(e) => return Err(self.api_failure(e).await),
        };
        debug!(group_id = %joined.group_id, "Joined group");

        match joined.message {
            Some(message) => println!("{}", message),
            None => println!("Joined group {}", joined.group_id),
        }
        Ok(())
    }

    pub async fn check(&self) -> Result<()> {
        let body = self.client.health_check().await?;
        println!("Backend at {} is up: {}", self.client.http().origin(), body.trim());
        Ok(())
    }
}

/// Read one trimmed line from stdin after printing a prompt.
fn prompt(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", label)?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read input")?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("{} is required", label.trim_end_matches(": "));
    }
    Ok(value)
}
