//! Triangulation: reconciles overlapping signal outputs into a
//! deduplicated service list using the confidence lattice and build-path
//! grouping.

use super::service::Service;
use std::collections::HashMap;

/// Signals rated at or above this confidence are explicit deployment specs;
/// below it they are generic evidence (dockerfile, package manifests).
pub const EXPLICIT_CONFIDENCE: u8 = 80;

/// One signal's contribution to a discovery run.
#[derive(Debug, Clone)]
pub struct SignalResult {
    pub services: Vec<Service>,
    pub confidence: u8,
    pub signal_id: &'static str,
}

#[derive(Debug, Clone)]
struct Candidate {
    service: Service,
    confidence: u8,
}

/// Merges signal outputs.
///
/// Services sharing a build path form a group. If any member of a group is
/// explicit (confidence >= 80), only the explicit members survive, one per
/// distinct name, and the generic members contribute their config refs to
/// the first survivor. Groups with only generic members merge per name,
/// highest confidence winning. Image-only services (empty build path) pass
/// through untouched.
///
/// Iteration order follows signal registration order, so confidence ties
/// resolve deterministically to the first-registered signal.
pub fn triangulate(results: &[SignalResult]) -> Vec<Service> {
    // Insertion-ordered grouping by build path.
    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Candidate>> = HashMap::new();
    let mut passthrough: Vec<Service> = Vec::new();

    for result in results {
        for service in &result.services {
            if service.build_path.is_empty() {
                passthrough.push(service.clone());
                continue;
            }
            let key = service.build_path.clone();
            if !groups.contains_key(&key) {
                group_order.push(key.clone());
            }
            groups.entry(key).or_default().push(Candidate {
                service: service.clone(),
                confidence: result.confidence,
            });
        }
    }

    let mut merged: Vec<Service> = Vec::new();
    for key in &group_order {
        let candidates = &groups[key];
        let max_confidence = candidates.iter().map(|c| c.confidence).max().unwrap_or(0);

        if max_confidence >= EXPLICIT_CONFIDENCE {
            merged.extend(merge_explicit_dominant(candidates));
        } else {
            merged.extend(merge_generic(candidates));
        }
    }

    merged.extend(passthrough);
    merged
}

/// Keeps one service per distinct name among the explicit members; generic
/// members only contribute config evidence, attached to the first survivor.
fn merge_explicit_dominant(candidates: &[Candidate]) -> Vec<Service> {
    let mut kept: Vec<(Service, u8)> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for candidate in candidates
        .iter()
        .filter(|c| c.confidence >= EXPLICIT_CONFIDENCE)
    {
        match index_by_name.get(&candidate.service.name) {
            None => {
                index_by_name.insert(candidate.service.name.clone(), kept.len());
                kept.push((candidate.service.clone(), candidate.confidence));
            }
            Some(&i) => {
                let (existing, existing_confidence) = &mut kept[i];
                if candidate.confidence > *existing_confidence {
                    // Higher-confidence base wins its fields; the evidence
                    // trail accumulates either way.
                    let mut replacement = candidate.service.clone();
                    for config in existing.configs.drain(..) {
                        replacement.add_config(config);
                    }
                    *existing = replacement;
                    *existing_confidence = candidate.confidence;
                } else {
                    for config in &candidate.service.configs {
                        existing.add_config(config.clone());
                    }
                }
            }
        }
    }

    for candidate in candidates
        .iter()
        .filter(|c| c.confidence < EXPLICIT_CONFIDENCE)
    {
        if let Some((first, _)) = kept.first_mut() {
            for config in &candidate.service.configs {
                first.add_config(config.clone());
            }
        }
    }

    kept.into_iter().map(|(service, _)| service).collect()
}

/// No explicit member: group per name, highest-confidence base, configs
/// unioned across the name group.
fn merge_generic(candidates: &[Candidate]) -> Vec<Service> {
    let mut kept: Vec<(Service, u8)> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        match index_by_name.get(&candidate.service.name) {
            None => {
                index_by_name.insert(candidate.service.name.clone(), kept.len());
                kept.push((candidate.service.clone(), candidate.confidence));
            }
            Some(&i) => {
                let (existing, existing_confidence) = &mut kept[i];
                if candidate.confidence > *existing_confidence {
                    let mut replacement = candidate.service.clone();
                    for config in existing.configs.drain(..) {
                        replacement.add_config(config);
                    }
                    *existing = replacement;
                    *existing_confidence = candidate.confidence;
                } else {
                    for config in &candidate.service.configs {
                        existing.add_config(config.clone());
                    }
                }
            }
        }
    }

    kept.into_iter().map(|(service, _)| service).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::service::{Build, ConfigRef, Network, Runtime};

    fn service(name: &str, build_path: &str, config_type: &str, config_path: &str) -> Service {
        Service {
            name: name.to_string(),
            network: Network::Private,
            runtime: Runtime::Continuous,
            build: Build::FromSource,
            build_path: build_path.to_string(),
            image: String::new(),
            configs: vec![ConfigRef::new(config_type, config_path)],
        }
    }

    fn image_service(name: &str, image: &str, config_path: &str) -> Service {
        Service {
            name: name.to_string(),
            network: Network::Private,
            runtime: Runtime::Continuous,
            build: Build::FromImage,
            build_path: String::new(),
            image: image.to_string(),
            configs: vec![ConfigRef::new("docker-compose", config_path)],
        }
    }

    #[test]
    fn test_explicit_absorbs_generic_evidence() {
        let results = vec![
            SignalResult {
                services: vec![service("myapp", ".", "railway", "./railway.json")],
                confidence: 95,
                signal_id: "railway",
            },
            SignalResult {
                services: vec![service("myapp", ".", "dockerfile", "./Dockerfile")],
                confidence: 70,
                signal_id: "dockerfile",
            },
        ];

        let merged = triangulate(&results);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "myapp");
        assert_eq!(merged[0].configs.len(), 2);
        assert_eq!(merged[0].configs[0].config_type, "railway");
        assert_eq!(merged[0].configs[1].config_type, "dockerfile");
    }

    #[test]
    fn test_sibling_services_preserved() {
        let results = vec![SignalResult {
            services: vec![
                service("web", ".", "procfile", "./Procfile"),
                service("worker", ".", "procfile", "./Procfile"),
            ],
            confidence: 85,
            signal_id: "heroku-procfile",
        }];

        let merged = triangulate(&results);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "web");
        assert_eq!(merged[1].name, "worker");
    }

    #[test]
    fn test_generic_only_group_merges_by_name() {
        let results = vec![
            SignalResult {
                services: vec![service("api", "./api", "dockerfile", "./api/Dockerfile")],
                confidence: 70,
                signal_id: "dockerfile",
            },
            SignalResult {
                services: vec![service("api", "./api", "package", "./api/package.json")],
                confidence: 50,
                signal_id: "package",
            },
        ];

        let merged = triangulate(&results);
        assert_eq!(merged.len(), 1);
        // Highest-confidence member is the base.
        assert_eq!(merged[0].configs[0].config_type, "dockerfile");
        assert_eq!(merged[0].configs.len(), 2);
    }

    #[test]
    fn test_image_only_services_pass_through() {
        let results = vec![SignalResult {
            services: vec![
                service("web", "./web", "docker-compose", "./docker-compose.yml"),
                image_service("redis", "redis:7", "./docker-compose.yml"),
            ],
            confidence: 80,
            signal_id: "docker-compose",
        }];

        let merged = triangulate(&results);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().any(|s| s.name == "redis" && s.image == "redis:7"));
    }

    #[test]
    fn test_explicit_base_fields_win_over_generic() {
        let mut explicit = service("app", ".", "fly", "./fly.toml");
        explicit.network = Network::Public;

        let results = vec![
            SignalResult {
                services: vec![service("app", ".", "dockerfile", "./Dockerfile")],
                confidence: 70,
                signal_id: "dockerfile",
            },
            SignalResult {
                services: vec![explicit],
                confidence: 95,
                signal_id: "fly",
            },
        ];

        let merged = triangulate(&results);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].network, Network::Public);
        assert_eq!(merged[0].configs.len(), 2);
    }

    #[test]
    fn test_tie_break_is_first_registered() {
        let mut first = service("app", ".", "fly", "./fly.toml");
        first.network = Network::Public;
        let mut second = service("app", ".", "render", "./render.yaml");
        second.network = Network::None;

        let results = vec![
            SignalResult {
                services: vec![first],
                confidence: 95,
                signal_id: "fly",
            },
            SignalResult {
                services: vec![second],
                confidence: 95,
                signal_id: "render",
            },
        ];

        let merged = triangulate(&results);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].network, Network::Public);
    }

    #[test]
    fn test_idempotent() {
        let results = vec![
            SignalResult {
                services: vec![
                    service("web", ".", "procfile", "./Procfile"),
                    service("worker", ".", "procfile", "./Procfile"),
                ],
                confidence: 85,
                signal_id: "heroku-procfile",
            },
            SignalResult {
                services: vec![service("web", ".", "dockerfile", "./Dockerfile")],
                confidence: 70,
                signal_id: "dockerfile",
            },
        ];

        let merged = triangulate(&results);

        // Feed the output back, one service per synthetic signal result.
        let rerun: Vec<SignalResult> = merged
            .iter()
            .map(|s| SignalResult {
                services: vec![s.clone()],
                confidence: 85,
                signal_id: "replay",
            })
            .collect();

        assert_eq!(triangulate(&rerun), merged);
    }

    #[test]
    fn test_distinct_keys_in_output() {
        let results = vec![
            SignalResult {
                services: vec![
                    service("a", "./x", "fly", "./x/fly.toml"),
                    service("b", "./x", "render", "./x/render.yaml"),
                    service("a", "./y", "fly", "./y/fly.toml"),
                ],
                confidence: 95,
                signal_id: "s1",
            },
            SignalResult {
                services: vec![service("a", "./x", "package", "./x/package.json")],
                confidence: 50,
                signal_id: "s2",
            },
        ];

        let merged = triangulate(&results);
        let mut keys: Vec<(String, String)> = merged
            .iter()
            .map(|s| (s.build_path.clone(), s.name.clone()))
            .collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), before);
    }
}
