//! Marketing copy edited from the back-office and rendered by the storefront.
//!
//! Each known key stores one JSON document. Reads shallow-merge the stored
//! document over the built-in defaults, so older rows missing newer fields
//! still render.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{
    client::TableStore,
    error::GatewayError,
    query::Direction,
    records::{Entity, Fetched, Loaded, Quarantined},
};

pub const TABLE: &str = "cms_content";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmsKey {
    HomeHero,
    ContactInfo,
    AboutPage,
}

impl CmsKey {
    pub const ALL: [CmsKey; 3] = [CmsKey::HomeHero, CmsKey::ContactInfo, CmsKey::AboutPage];

    pub fn as_str(self) -> &'static str {
        match self {
            CmsKey::HomeHero => "home_hero",
            CmsKey::ContactInfo => "contact_info",
            CmsKey::AboutPage => "about_page",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|known| known.as_str() == key)
    }
}

impl fmt::Display for CmsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeHero {
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socials {
    pub instagram: String,
    pub whatsapp: String,
    pub telegram: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub phone: String,
    pub email: String,
    pub address: String,
    pub schedule: String,
    pub brand_name: String,
    pub footer_description: String,
    pub socials: Socials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub years: String,
    pub projects: String,
    pub support: String,
    pub warranty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutPage {
    pub title: String,
    pub description: String,
    pub stats: Stats,
}

impl Default for HomeHero {
    fn default() -> Self {
        Self {
            title: "INDUSTRIAL WELDING".to_string(),
            subtitle: "Precision welding for industry and private clients. Every seam is \
                       quality-guaranteed to GOST 14771-76."
                .to_string(),
            button_text: "Request a quote".to_string(),
        }
    }
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            phone: "+7 (999) 000-00-00".to_string(),
            email: "info@svarka-pro.ru".to_string(),
            address: "Yekaterinburg, Industrial zone, 12".to_string(),
            schedule: "Mon-Fri: 9:00 - 18:00".to_string(),
            brand_name: "IRONFORGE".to_string(),
            footer_description: "The art of metalwork. Premium welding for those who value \
                                 quality, precision and finish."
                .to_string(),
            socials: Socials {
                instagram: "https://instagram.com".to_string(),
                whatsapp: "https://wa.me/79990000000".to_string(),
                telegram: "https://t.me/svarkapro".to_string(),
            },
        }
    }
}

impl Default for AboutPage {
    fn default() -> Self {
        Self {
            title: "About IRONFORGE".to_string(),
            description: "We have worked in Yekaterinburg since 2005, growing from a small \
                          workshop into a steel-structure contractor."
                .to_string(),
            stats: Stats {
                years: "15+".to_string(),
                projects: "500+".to_string(),
                support: "24/7".to_string(),
                warranty: "100%".to_string(),
            },
        }
    }
}

/// One editable section, tagged by its storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmsSection {
    HomeHero(HomeHero),
    ContactInfo(ContactInfo),
    AboutPage(AboutPage),
}

impl CmsSection {
    pub fn key(&self) -> CmsKey {
        match self {
            CmsSection::HomeHero(_) => CmsKey::HomeHero,
            CmsSection::ContactInfo(_) => CmsKey::ContactInfo,
            CmsSection::AboutPage(_) => CmsKey::AboutPage,
        }
    }

    pub fn default_for(key: CmsKey) -> Self {
        match key {
            CmsKey::HomeHero => CmsSection::HomeHero(HomeHero::default()),
            CmsKey::ContactInfo => CmsSection::ContactInfo(ContactInfo::default()),
            CmsKey::AboutPage => CmsSection::AboutPage(AboutPage::default()),
        }
    }

    /// Decodes a full section document submitted for `key`.
    pub fn from_json(key: CmsKey, content: Value) -> Result<Self, serde_json::Error> {
        Ok(match key {
            CmsKey::HomeHero => CmsSection::HomeHero(serde_json::from_value(content)?),
            CmsKey::ContactInfo => CmsSection::ContactInfo(serde_json::from_value(content)?),
            CmsKey::AboutPage => CmsSection::AboutPage(serde_json::from_value(content)?),
        })
    }

    pub fn content(&self) -> Result<Value, serde_json::Error> {
        match self {
            CmsSection::HomeHero(section) => serde_json::to_value(section),
            CmsSection::ContactInfo(section) => serde_json::to_value(section),
            CmsSection::AboutPage(section) => serde_json::to_value(section),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CmsContent {
    pub home_hero: HomeHero,
    pub contact_info: ContactInfo,
    pub about_page: AboutPage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmsRow {
    pub key: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for CmsRow {
    const TABLE: &'static str = TABLE;
    const ORDER_BY: (&'static str, Direction) = ("key", Direction::Ascending);
}

fn overlay<T>(base: &T, content: &Value) -> Result<T, serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let Value::Object(fields) = content else {
        return Err(serde::de::Error::custom("section content must be a JSON object"));
    };

    let mut merged = serde_json::to_value(base)?;
    if let Value::Object(target) = &mut merged {
        for (field, value) in fields {
            target.insert(field.clone(), value.clone());
        }
    }

    serde_json::from_value(merged)
}

impl CmsContent {
    /// Overlays one stored row. Rows without content are skipped.
    pub fn apply(&mut self, key: CmsKey, content: &Value) -> Result<(), serde_json::Error> {
        if content.is_null() {
            return Ok(());
        }

        match key {
            CmsKey::HomeHero => self.home_hero = overlay(&self.home_hero, content)?,
            CmsKey::ContactInfo => self.contact_info = overlay(&self.contact_info, content)?,
            CmsKey::AboutPage => self.about_page = overlay(&self.about_page, content)?,
        }

        Ok(())
    }

    pub fn merged(rows: Vec<CmsRow>) -> Loaded<Self> {
        let mut value = Self::default();
        let mut quarantined = Vec::new();

        for row in rows {
            let Some(key) = CmsKey::parse(&row.key) else {
                debug!(key = %row.key, "Ignoring unknown content key");
                continue;
            };

            if let Err(e) = value.apply(key, &row.content) {
                warn!(%key, error = %e, "Stored content does not fit its section, keeping defaults");
                quarantined.push(Quarantined {
                    row: json!({ "key": row.key, "content": row.content }),
                    reason: e.to_string(),
                });
            }
        }

        Loaded { value, quarantined }
    }
}

pub async fn load<S: TableStore>(store: &S) -> Result<Loaded<CmsContent>, GatewayError> {
    let rows = store.select(&CmsRow::list_query()).await?;
    let fetched: Fetched<CmsRow> = Fetched::decode(TABLE, rows);

    let mut loaded = CmsContent::merged(fetched.records);
    loaded.quarantined.extend(fetched.quarantined);

    Ok(loaded)
}

pub async fn save<S: TableStore>(store: &S, section: &CmsSection) -> Result<(), GatewayError> {
    let row = json!({
        "key": section.key().as_str(),
        "content": section.content()?,
        "updated_at": Utc::now().to_rfc3339(),
    });

    store.upsert(TABLE, &[row], "key").await?;

    Ok(())
}
