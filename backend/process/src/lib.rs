//! # Operator tasks
//!
//! Jobs run by hand against the hosted gateway, outside the web service.
//!
//! - `seed`: writes the built-in calculator rates and site copy for every key
//!   the tables do not have yet, so a fresh project renders sensible pages.
//!   With `--force` every key is rewritten.
//! - `stats`: prints the same counts the dashboard shows.
//!
//! Both run as the signed-in staff member when credentials are given, which
//! is required wherever row-level policies forbid anonymous writes.
use std::{collections::HashSet, fmt};

use anyhow::{Context, Result};
use gateway::{
    AuthService, Gateway, RestGateway, TableStore,
    models::{
        Application, Order, Product, Service,
        calculator::{self, CalculatorSetting, CalculatorSettings, OnRejection},
        cms::{self, CmsKey, CmsRow, CmsSection},
    },
    records::Entity,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub async fn connect(
    gateway_url: &str,
    anon_key: &str,
    credentials: Option<&Credentials>,
) -> Result<RestGateway> {
    let gateway = RestGateway::new(gateway_url, anon_key).context("Invalid gateway settings")?;

    let Some(credentials) = credentials else {
        info!("No credentials given, running with the anon key");
        return Ok(gateway);
    };

    let session = gateway
        .sign_in_with_password(&credentials.email, &credentials.password)
        .await
        .with_context(|| format!("Sign-in failed for {}", credentials.email))?;
    info!(email = %credentials.email, "Signed in");

    Ok(gateway.authorized(&session.access_token))
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub settings: usize,
    pub sections: usize,
}

async fn stored_keys<S: TableStore>(store: &S, table: &str) -> Result<HashSet<String>> {
    let rows = store
        .select(&gateway::TableQuery::from(table).select("key"))
        .await
        .with_context(|| format!("Failed to read {table}"))?;

    Ok(rows
        .iter()
        .filter_map(|row| row.get("key")?.as_str().map(str::to_string))
        .collect())
}

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    Ok(pb)
}

pub async fn seed<S: TableStore>(store: &S, force: bool) -> Result<SeedReport> {
    let (stored_settings, stored_sections) = if force {
        (HashSet::new(), HashSet::new())
    } else {
        (
            stored_keys(store, CalculatorSetting::TABLE).await?,
            stored_keys(store, CmsRow::TABLE).await?,
        )
    };

    let mut settings = CalculatorSettings::default();
    settings.retain(|key| !stored_settings.contains(key));

    let sections: Vec<CmsKey> = CmsKey::ALL
        .into_iter()
        .filter(|key| !stored_sections.contains(key.as_str()))
        .collect();

    let steps = usize::from(!settings.is_empty()) + sections.len();
    let pb = progress_bar(steps as u64)?;

    if !settings.is_empty() {
        pb.set_message("Writing calculator defaults");
        let phase = calculator::save(store, &settings, OnRejection::PerKeyUpdate)
            .await
            .context("Failed to write calculator defaults")?;
        info!(keys = settings.len(), ?phase, "Calculator defaults written");
        pb.inc(1);
    }

    for key in &sections {
        pb.set_message(format!("Writing {key}"));
        cms::save(store, &CmsSection::default_for(*key))
            .await
            .with_context(|| format!("Failed to write {key}"))?;
        pb.inc(1);
    }

    pb.finish_with_message("Done");

    Ok(SeedReport {
        settings: settings.len(),
        sections: sections.len(),
    })
}

#[derive(Debug, PartialEq, Eq)]
pub struct Counts {
    pub orders: u64,
    pub products: u64,
    pub services: u64,
    pub applications: u64,
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Orders: {}", self.orders)?;
        writeln!(f, "Products: {}", self.products)?;
        writeln!(f, "Services: {}", self.services)?;
        write!(f, "Applications: {}", self.applications)
    }
}

pub async fn stats<S: TableStore>(store: &S) -> Result<Counts> {
    let (orders, products, services, applications) = tokio::try_join!(
        store.count(Order::TABLE),
        store.count(Product::TABLE),
        store.count(Service::TABLE),
        store.count(Application::TABLE),
    )
    .context("Failed to count rows")?;

    Ok(Counts {
        orders,
        products,
        services,
        applications,
    })
}
