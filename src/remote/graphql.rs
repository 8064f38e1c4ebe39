//! # GraphQL Transport
//!
//! The canvas service speaks GraphQL over HTTP POST with a `{data, errors}`
//! envelope. Batched operations use one aliased field per pixel (`a0:`,
//! `a1:`, ...); pixel arguments are written as unquoted-key object
//! literals, e.g. `{x:12,y:7,color:3}`.
//!
//! Level-query responses are re-ordered by parsing the alias index back
//! out of each response key, so positional alignment with the request
//! never depends on JSON object iteration order.

use async_trait::async_trait;
use serde_json::Value;

use crate::canvas::PixelLevel;
use crate::engine::dispatch::{MutationSink, SubmitOutcome};
use crate::engine::schedule::MutationIntent;
use crate::error::{WardenError, WardenResult};
use crate::palette::PaletteColor;
use crate::remote::{CanvasQuery, CanvasService};

/// HTTP client for the canvas service's GraphQL endpoint.
pub struct GraphqlClient {
    http: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl GraphqlClient {
    pub fn new(endpoint: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            auth_token,
        }
    }

    /// POST a query and split the envelope into (data, error messages).
    async fn execute(&self, operation: &str, query: &str) -> WardenResult<(Value, Vec<String>)> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": query }));
        if let Some(token) = &self.auth_token {
            request = request.header("authorization", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WardenError::network(operation, e))?;
        let envelope: Value = response
            .json()
            .await
            .map_err(|e| WardenError::network(operation, e))?;

        let errors = envelope
            .get("errors")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|err| {
                        err.get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown error")
                            .to_string()
                    })
                    .collect()
            })
            .unwrap_or_default();

        let data = envelope.get("data").cloned().unwrap_or(Value::Null);
        Ok((data, errors))
    }

    /// POST a query, treating any reported error as fatal.
    async fn run_query(&self, operation: &str, query: &str) -> WardenResult<Value> {
        let (data, errors) = self.execute(operation, query).await?;
        if !errors.is_empty() {
            return Err(WardenError::rejected(errors));
        }
        if data.is_null() {
            return Err(WardenError::protocol(operation, "missing data field"));
        }
        Ok(data)
    }

    /// URL of the most recent board snapshot.
    pub async fn last_board_url(&self) -> WardenResult<String> {
        let data = self
            .run_query("lastBoardUrl", "query lastBoardUrl { lastBoardUrl }")
            .await?;
        data.get("lastBoardUrl")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| WardenError::protocol("lastBoardUrl", "missing board URL"))
    }

    /// Download raw bytes from a board snapshot URL.
    pub async fn download(&self, url: &str) -> WardenResult<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WardenError::network("board download", e))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| WardenError::network("board download", e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl CanvasQuery for GraphqlClient {
    async fn pixel_levels(&self, coords: &[(i32, i32)]) -> WardenResult<Vec<PixelLevel>> {
        if coords.is_empty() {
            return Ok(Vec::new());
        }
        let fields: String = coords
            .iter()
            .enumerate()
            .map(|(i, (x, y))| {
                format!("a{}: getPixelLevel(pixel: {{x:{},y:{}}}) {{ x y level }} ", i, x, y)
            })
            .collect();
        let query = format!("query getPixelLevel {{ {}}}", fields);

        let data = self.run_query("getPixelLevel", &query).await?;
        parse_level_response(&data, coords.len())
    }
}

#[async_trait]
impl MutationSink for GraphqlClient {
    async fn submit(&mut self, batch: &[MutationIntent]) -> WardenResult<SubmitOutcome> {
        if batch.is_empty() {
            return Ok(SubmitOutcome::ok());
        }
        let query = mutation_query(batch);
        let (_, errors) = self.execute("submit", &query).await?;
        Ok(SubmitOutcome { errors })
    }
}

#[async_trait]
impl CanvasService for GraphqlClient {
    async fn fetch_palette(&self) -> WardenResult<Vec<PaletteColor>> {
        let data = self
            .run_query(
                "getAvailableColors",
                "query getAvailableColors { getAvailableColors { name colorCode }}",
            )
            .await?;
        let colors = data
            .get("getAvailableColors")
            .cloned()
            .ok_or_else(|| WardenError::protocol("getAvailableColors", "missing color list"))?;
        serde_json::from_value(colors)
            .map_err(|e| WardenError::protocol("getAvailableColors", e.to_string()))
    }

    async fn fetch_board(&self) -> WardenResult<Vec<u8>> {
        let url = self.last_board_url().await?;
        self.download(&url).await
    }
}

/// Rebuild the positionally ordered level list from aliased response keys.
fn parse_level_response(data: &Value, requested: usize) -> WardenResult<Vec<PixelLevel>> {
    let map = data
        .as_object()
        .ok_or_else(|| WardenError::protocol("getPixelLevel", "data is not an object"))?;

    let mut slots: Vec<Option<PixelLevel>> = vec![None; requested];
    for (key, value) in map {
        let index: usize = key
            .strip_prefix('a')
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                WardenError::protocol("getPixelLevel", format!("unexpected alias '{}'", key))
            })?;
        if index >= requested {
            return Err(WardenError::protocol(
                "getPixelLevel",
                format!("alias '{}' out of range", key),
            ));
        }
        if value.is_null() {
            continue; // unanswered coordinate, caught below
        }
        slots[index] = Some(parse_level_entry(value)?);
    }

    let received = slots.iter().filter(|s| s.is_some()).count();
    if received != requested {
        return Err(WardenError::level_query(requested, received));
    }
    Ok(slots.into_iter().flatten().collect())
}

fn parse_level_entry(value: &Value) -> WardenResult<PixelLevel> {
    let field = |name: &str| {
        value.get(name).and_then(Value::as_i64).ok_or_else(|| {
            WardenError::protocol("getPixelLevel", format!("missing integer field '{}'", name))
        })
    };
    Ok(PixelLevel {
        x: field("x")? as i32,
        y: field("y")? as i32,
        level: field("level")? as u32,
    })
}

/// Render one mutation document for a homogeneous batch.
///
/// Reinforcement batches become `upgradePixels` calls; correction batches
/// become `setPixels` calls, each optionally paired with an `upgradePixels`
/// raising the repainted pixel by one level.
fn mutation_query(batch: &[MutationIntent]) -> String {
    let name = match batch[0] {
        MutationIntent::Raise { .. } => "upgradePixels",
        MutationIntent::Repaint { .. } => "setPixels",
    };
    let fields: String = batch
        .iter()
        .enumerate()
        .map(|(i, intent)| match intent {
            MutationIntent::Raise { x, y, target_level } => format!(
                "a{}: upgradePixels(pixels: [{{x:{},y:{},targetLevel:{}}}]) ",
                i, x, y, target_level
            ),
            MutationIntent::Repaint {
                x,
                y,
                color,
                current_level,
                upgrade,
            } => {
                let mut field = format!(
                    "a{}: setPixels(pixels: [{{x:{},y:{},color:{},currentLevel:{}}}]) ",
                    i, x, y, color, current_level
                );
                if *upgrade {
                    field.push_str(&format!(
                        "b{}: upgradePixels(pixels: [{{x:{},y:{},targetLevel:{}}}]) ",
                        i,
                        x,
                        y,
                        current_level + 1
                    ));
                }
                field
            }
        })
        .collect();
    format!("mutation {} {{ {}}}", name, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_level_response_realigns_by_alias() {
        // serde_json object order sorts "a10" before "a2"; alignment must
        // come from the alias index, not iteration order.
        let mut data = serde_json::Map::new();
        for i in 0..11 {
            data.insert(
                format!("a{}", i),
                json!({ "x": i, "y": 0, "level": i % 4 }),
            );
        }
        let levels = parse_level_response(&Value::Object(data), 11).unwrap();
        for (i, level) in levels.iter().enumerate() {
            assert_eq!(level.x, i as i32);
            assert_eq!(level.level, (i % 4) as u32);
        }
    }

    #[test]
    fn test_parse_level_response_rejects_short_answers() {
        let data = json!({ "a0": { "x": 1, "y": 2, "level": 0 } });
        let err = parse_level_response(&data, 2).unwrap_err();
        assert!(matches!(
            err,
            WardenError::LevelQuery {
                requested: 2,
                received: 1
            }
        ));
    }

    #[test]
    fn test_parse_level_response_rejects_null_entries() {
        let data = json!({
            "a0": { "x": 1, "y": 2, "level": 0 },
            "a1": null,
        });
        assert!(parse_level_response(&data, 2).is_err());
    }

    #[test]
    fn test_parse_level_response_rejects_unknown_aliases() {
        let data = json!({ "b0": { "x": 1, "y": 2, "level": 0 } });
        assert!(parse_level_response(&data, 1).is_err());
    }

    #[test]
    fn test_mutation_query_for_reinforcement() {
        let batch = [
            MutationIntent::Raise { x: 1, y: 2, target_level: 3 },
            MutationIntent::Raise { x: 4, y: 5, target_level: 1 },
        ];
        let query = mutation_query(&batch);
        assert!(query.starts_with("mutation upgradePixels {"));
        assert!(query.contains("a0: upgradePixels(pixels: [{x:1,y:2,targetLevel:3}])"));
        assert!(query.contains("a1: upgradePixels(pixels: [{x:4,y:5,targetLevel:1}])"));
    }

    #[test]
    fn test_mutation_query_for_correction_with_upgrade() {
        let batch = [MutationIntent::Repaint {
            x: 7,
            y: 8,
            color: 2,
            current_level: 1,
            upgrade: true,
        }];
        let query = mutation_query(&batch);
        assert!(query.starts_with("mutation setPixels {"));
        assert!(query.contains("a0: setPixels(pixels: [{x:7,y:8,color:2,currentLevel:1}])"));
        assert!(query.contains("b0: upgradePixels(pixels: [{x:7,y:8,targetLevel:2}])"));
    }

    #[test]
    fn test_mutation_query_without_upgrade_has_no_companion_field() {
        let batch = [MutationIntent::Repaint {
            x: 0,
            y: 0,
            color: 1,
            current_level: 0,
            upgrade: false,
        }];
        let query = mutation_query(&batch);
        assert!(!query.contains("upgradePixels"));
    }
}
