use anyhow::{anyhow, Result};
use hearth_core::error::CoreError;
use hearth_core::repository::{short_id, Repository};
use uuid::Uuid;

/// Resolves a full UUID or a short id to a pattern id.
pub async fn resolve_pattern_id(repo: &impl Repository, input: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }
    let patterns = repo.find_patterns_by_short_id(input).await?;
    pick_one(
        input,
        "pattern",
        patterns.into_iter().map(|p| (p.id, p.title)).collect(),
    )
}

/// Resolves a full UUID or a short id to a task id.
pub async fn resolve_instance_id(repo: &impl Repository, input: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }
    let instances = repo.find_instances_by_short_id(input).await?;
    pick_one(
        input,
        "task",
        instances.into_iter().map(|i| (i.id, i.title)).collect(),
    )
}

fn pick_one(input: &str, kind: &str, mut matches: Vec<(Uuid, String)>) -> Result<Uuid> {
    match matches.len() {
        1 => Ok(matches.remove(0).0),
        0 => Err(anyhow!(CoreError::NotFound(format!(
            "No {} found with ID '{}'",
            kind, input
        )))),
        _ => {
            let candidates = matches
                .into_iter()
                .map(|(id, title)| (short_id(&id), title))
                .collect();
            Err(anyhow!(CoreError::AmbiguousId(candidates)))
        }
    }
}
