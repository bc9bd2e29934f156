//! Query planning.
//!
//! Deterministic rules map an [`Intent`] to catalog keyword searches. Each
//! rule pairs a keyword set (matched case-insensitively against
//! `data_needed`) with the query templates it emits. Rules are independent:
//! one intent can fire both the agriculture and the climate rule, and their
//! queries appear in table order.

use crate::intent::Intent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Query emitted when no rule fires.
pub const FALLBACK_QUERY: &str = "agriculture statistics india";

/// A single keyword string submitted to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self(query.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for SearchQuery {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Intent list a template appends to its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentList {
    Crops,
    States,
}

impl IntentList {
    fn values<'a>(&self, intent: &'a Intent) -> &'a [String] {
        match self {
            Self::Crops => &intent.crops,
            Self::States => &intent.states,
        }
    }
}

/// `"<prefix> <list joined by spaces>"`, or `fallback` when the list is empty.
#[derive(Debug, Clone, Copy)]
pub struct QueryTemplate {
    pub prefix: &'static str,
    pub list: IntentList,
    /// `None` means the template emits nothing for an empty list
    pub fallback: Option<&'static str>,
}

impl QueryTemplate {
    fn render(&self, intent: &Intent) -> Option<SearchQuery> {
        let terms: Vec<&str> = self
            .list
            .values(intent)
            .iter()
            .map(|term| term.trim())
            .filter(|term| !term.is_empty())
            .collect();

        if terms.is_empty() {
            self.fallback.map(SearchQuery::new)
        } else {
            Some(SearchQuery::new(format!("{} {}", self.prefix, terms.join(" "))))
        }
    }
}

/// Keyword set and the templates it triggers.
#[derive(Debug, Clone, Copy)]
pub struct PlanRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub templates: &'static [QueryTemplate],
}

impl PlanRule {
    /// Whether `data_needed` mentions any of the rule's keywords.
    pub fn matches(&self, intent: &Intent) -> bool {
        let data_needed = intent.data_needed.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| data_needed.contains(keyword))
    }
}

pub const RULES: &[PlanRule] = &[
    PlanRule {
        name: "agriculture",
        keywords: &["production", "crop", "yield", "area"],
        templates: &[
            QueryTemplate {
                prefix: "crop production",
                list: IntentList::Crops,
                fallback: Some("district crop production statistics"),
            },
            QueryTemplate {
                prefix: "agricultural statistics",
                list: IntentList::States,
                fallback: None,
            },
        ],
    },
    PlanRule {
        name: "climate",
        keywords: &["rainfall", "weather", "climate", "temperature"],
        templates: &[QueryTemplate {
            prefix: "rainfall",
            list: IntentList::States,
            fallback: Some("rainfall statistics"),
        }],
    },
];

/// Plan the full, ordered list of catalog queries for an intent.
///
/// Always returns at least one query. How many of them run is decided by
/// the retriever, not here.
pub fn plan(intent: &Intent) -> Vec<SearchQuery> {
    plan_with(RULES, intent)
}

/// [`plan`] against an explicit rule table.
pub fn plan_with(rules: &[PlanRule], intent: &Intent) -> Vec<SearchQuery> {
    let mut queries: Vec<SearchQuery> = rules
        .iter()
        .filter(|rule| rule.matches(intent))
        .inspect(|rule| tracing::debug!(rule = rule.name, "Planner rule fired"))
        .flat_map(|rule| rule.templates.iter().filter_map(|t| t.render(intent)))
        .collect();

    if queries.is_empty() {
        queries.push(SearchQuery::new(FALLBACK_QUERY));
    }

    tracing::info!("Planned {} search queries", queries.len());

    queries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(data_needed: &str, states: &[&str], crops: &[&str]) -> Intent {
        Intent {
            data_needed: data_needed.to_string(),
            states: states.iter().map(|s| s.to_string()).collect(),
            crops: crops.iter().map(|s| s.to_string()).collect(),
            ..Intent::default()
        }
    }

    #[test]
    fn test_plan_is_deterministic() {
        let intent = intent("rice production and rainfall", &["Punjab", "Haryana"], &["rice"]);
        let first = plan(&intent);
        for _ in 0..5 {
            assert_eq!(plan(&intent), first);
        }
    }

    #[test]
    fn test_crop_query_without_states() {
        let queries = plan(&intent("wheat production", &[], &["wheat"]));
        assert_eq!(queries, vec![SearchQuery::new("crop production wheat")]);
    }

    #[test]
    fn test_crop_and_climate_rules_combine_in_order() {
        let queries = plan(&intent("rainfall and crop yield trends", &["Maharashtra"], &[]));
        assert_eq!(
            queries,
            vec![
                SearchQuery::new("district crop production statistics"),
                SearchQuery::new("agricultural statistics Maharashtra"),
                SearchQuery::new("rainfall Maharashtra"),
            ]
        );
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        assert_eq!(plan(&Intent::empty()), vec![SearchQuery::new(FALLBACK_QUERY)]);
        assert_eq!(
            plan(&intent("soil health", &["Goa"], &["cashew"])),
            vec![SearchQuery::new("agriculture statistics india")]
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let queries = plan(&intent("RAINFALL", &[], &[]));
        assert_eq!(queries, vec![SearchQuery::new("rainfall statistics")]);
    }

    #[test]
    fn test_multiple_terms_joined_with_spaces() {
        let queries = plan(&intent("crop production", &["Punjab", "Haryana"], &["rice", "wheat"]));
        assert_eq!(queries[0], "crop production rice wheat");
        assert_eq!(queries[1], "agricultural statistics Punjab Haryana");
        assert_eq!(queries.len(), 2);
    }

    #[test]
    fn test_blank_terms_are_ignored() {
        let queries = plan(&intent("yield", &[" "], &[""]));
        assert_eq!(queries, vec![SearchQuery::new("district crop production statistics")]);
    }

    #[test]
    fn test_every_rule_fires() {
        let queries = plan(&intent("crop area and temperature", &["Kerala"], &["coconut"]));
        assert_eq!(queries.len(), 3);

        let queries = plan(&intent("production, weather", &["Bihar"], &["maize"]));
        assert_eq!(
            queries,
            vec![
                SearchQuery::new("crop production maize"),
                SearchQuery::new("agricultural statistics Bihar"),
                SearchQuery::new("rainfall Bihar"),
            ]
        );
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = [PlanRule {
            name: "soil",
            keywords: &["soil"],
            templates: &[QueryTemplate {
                prefix: "soil health card",
                list: IntentList::States,
                fallback: Some("soil health card"),
            }],
        }];
        let queries = plan_with(&rules, &intent("soil quality", &["Goa"], &[]));
        assert_eq!(queries, vec![SearchQuery::new("soil health card Goa")]);
    }
}
