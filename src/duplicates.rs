//! Content-hash duplicate resolution.
//!
//! Planned moves are grouped by destination in first-seen order. In each
//! group of two or more, the first move is the original and stays as it is.
//! Every later move is compared to it by SHA-256: identical content marks the
//! move as a skippable duplicate, different content gives it a new
//! destination with the source's parent folder name in parentheses, e.g.
//! `Kontrakt (Styret).pdf`.
//!
//! Hashing runs in parallel. Results are collected per group before any
//! renaming happens, so the outcome does not depend on which hash finishes
//! first.

use crate::normalize::split_extension;
use crate::planner::Move;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

/// Used in a disambiguated name when the source has no parent folder.
const FALLBACK_PARENT: &str = "kopi";

/// Hex-encoded SHA-256 of a file's contents.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Moves after duplicate resolution, plus the moves that had to be dropped.
#[derive(Debug, Default)]
pub struct Resolution {
    pub moves: Vec<Move>,
    /// Sources that could not be hashed, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

/// Resolves destination collisions among `moves`.
///
/// Output order follows the groups' first-seen order, and within a group
/// the input order.
pub fn resolve_duplicates(moves: Vec<Move>) -> Resolution {
    let groups = group_by_destination(moves);

    let hashes: Vec<Vec<Result<String, String>>> = groups
        .par_iter()
        .map(|group| {
            if group.len() < 2 {
                return Vec::new();
            }
            group
                .par_iter()
                .map(|mv| {
                    let hash = hash_file(&mv.source).map_err(|e| e.to_string());
                    debug!(source = %mv.source.display(), ok = hash.is_ok(), "hashed");
                    hash
                })
                .collect()
        })
        .collect();

    let mut taken: HashSet<PathBuf> = groups
        .iter()
        .filter_map(|group| group.first())
        .map(|mv| mv.destination.clone())
        .collect();

    let mut resolution = Resolution::default();
    for (group, group_hashes) in groups.into_iter().zip(hashes) {
        if group_hashes.is_empty() {
            resolution.moves.extend(group);
            continue;
        }

        let mut members = group.into_iter().zip(group_hashes);
        let Some((original, original_hash)) = members.next() else {
            continue;
        };
        let original_hash = match original_hash {
            Ok(hash) => Some(hash),
            Err(reason) => {
                warn!(
                    source = %original.source.display(),
                    %reason,
                    "cannot hash original, treating its duplicates as different"
                );
                None
            }
        };
        let original_source = original.source.clone();
        resolution.moves.push(original);

        for (sibling, hash) in members {
            let hash = match hash {
                Ok(hash) => hash,
                Err(reason) => {
                    warn!(source = %sibling.source.display(), %reason, "cannot hash, dropping move");
                    resolution
                        .failures
                        .push((sibling.source, format!("Could not hash file: {reason}")));
                    continue;
                }
            };

            let identical = original_hash.as_deref() == Some(hash.as_str());
            let duplicate = sibling.into_duplicate(original_source.clone(), identical);
            if identical {
                resolution.moves.push(duplicate);
            } else {
                let destination =
                    disambiguate(&duplicate.destination, &duplicate.source, &mut taken);
                resolution.moves.push(duplicate.with_destination(destination));
            }
        }
    }

    resolution
}

fn group_by_destination(moves: Vec<Move>) -> Vec<Vec<Move>> {
    let mut index: HashMap<PathBuf, usize> = HashMap::new();
    let mut groups: Vec<Vec<Move>> = Vec::new();

    for mv in moves {
        match index.get(&mv.destination) {
            Some(&slot) => groups[slot].push(mv),
            None => {
                index.insert(mv.destination.clone(), groups.len());
                groups.push(vec![mv]);
            }
        }
    }

    groups
}

/// Inserts the source's parent folder name before the extension, adding a
/// counter when that name is already planned.
fn disambiguate(destination: &Path, source: &Path, taken: &mut HashSet<PathBuf>) -> PathBuf {
    let parent: String = source
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().nfc().collect())
        .unwrap_or_else(|| FALLBACK_PARENT.to_string());
    let file_name = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, extension) = split_extension(&file_name);
    let dir = destination.parent().unwrap_or(Path::new(""));

    let candidate = |label: &str| {
        let name = match extension {
            Some(ext) if !ext.is_empty() => format!("{stem} ({label}).{ext}"),
            _ => format!("{stem} ({label})"),
        };
        dir.join(name)
    };

    let mut path = candidate(&parent);
    let mut counter = 2;
    while taken.contains(&path) {
        path = candidate(&format!("{parent} {counter}"));
        counter += 1;
    }
    taken.insert(path.clone());
    path
}
