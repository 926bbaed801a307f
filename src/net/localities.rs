use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::harvest::HarvestError;

/// IBGE localities API, one collection of municipalities per state
pub const DEFAULT_LOCALITIES_ENDPOINT: &str =
    "https://servicodados.ibge.gov.br/api/v1/localidades/estados";

/// The 27 federative units: code and name
pub const STATES: [(&str, &str); 27] = [
    ("AC", "Acre"),
    ("AL", "Alagoas"),
    ("AP", "Amapá"),
    ("AM", "Amazonas"),
    ("BA", "Bahia"),
    ("CE", "Ceará"),
    ("DF", "Distrito Federal"),
    ("ES", "Espírito Santo"),
    ("GO", "Goiás"),
    ("MA", "Maranhão"),
    ("MT", "Mato Grosso"),
    ("MS", "Mato Grosso do Sul"),
    ("MG", "Minas Gerais"),
    ("PA", "Pará"),
    ("PB", "Paraíba"),
    ("PR", "Paraná"),
    ("PE", "Pernambuco"),
    ("PI", "Piauí"),
    ("RJ", "Rio de Janeiro"),
    ("RN", "Rio Grande do Norte"),
    ("RS", "Rio Grande do Sul"),
    ("RO", "Rondônia"),
    ("RR", "Roraima"),
    ("SC", "Santa Catarina"),
    ("SP", "São Paulo"),
    ("SE", "Sergipe"),
    ("TO", "Tocantins"),
];

/// Look up a state by code, ignoring case
pub fn find_state(code: &str) -> Option<(&'static str, &'static str)> {
    let code = code.trim();
    STATES
        .iter()
        .copied()
        .find(|(state, _)| state.eq_ignore_ascii_case(code))
}

/// `"SP - São Paulo"`
pub fn state_label(code: &str, name: &str) -> String {
    format!("{} - {}", code, name)
}

#[derive(Debug, Deserialize)]
struct MunicipalityRecord {
    #[serde(default)]
    nome: Option<String>,
}

/// Municipality names per state, fetched once per state and kept
pub struct MunicipalityDirectory {
    client: Client,
    endpoint: String,
    cache: HashMap<String, Vec<String>>,
}

impl MunicipalityDirectory {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            cache: HashMap::new(),
        }
    }

    /// Sorted municipality names of a state. A non-200 answer yields an
    /// empty list that is not cached.
    pub async fn municipalities(&mut self, state: &str) -> Result<&[String]> {
        let (code, _) = find_state(state).ok_or_else(|| HarvestError::UnknownState(state.to_string()))?;

        if !self.cache.contains_key(code) {
            let Some(names) = self.fetch(code).await? else {
                return Ok(&[]);
            };
            self.cache.insert(code.to_string(), names);
        } else {
            debug!("Municipalities of {} served from cache", code);
        }

        Ok(self.cache.get(code).map(Vec::as_slice).unwrap_or_default())
    }

    /// Whether the state's list contains `city`, ignoring case
    pub async fn contains(&mut self, state: &str, city: &str) -> Result<bool> {
        let city = city.trim().to_lowercase();
        let names = self.municipalities(state).await?;
        Ok(names.iter().any(|name| name.to_lowercase() == city))
    }

    pub fn is_cached(&self, state: &str) -> bool {
        find_state(state).is_some_and(|(code, _)| self.cache.contains_key(code))
    }

    async fn fetch(&self, code: &str) -> Result<Option<Vec<String>>> {
        let url = format!("{}/{}/municipios", self.endpoint, code);
        debug!("Fetching municipalities from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context(format!("Failed to request municipalities of {}", code))?;

        if response.status() != StatusCode::OK {
            warn!("Municipality lookup for {} answered with HTTP {}", code, response.status());
            return Ok(None);
        }

        let records: Vec<MunicipalityRecord> = response
            .json()
            .await
            .context(format!("Failed to parse municipalities of {}", code))?;

        let mut names: Vec<String> = records
            .into_iter()
            .filter_map(|record| record.nome)
            .filter(|name| !name.is_empty())
            .collect();
        names.sort();

        Ok(Some(names))
    }
}
