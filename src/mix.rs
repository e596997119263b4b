//! Category mix model: which request categories a run generates, in what
//! proportions, and how each is rendered.
//!
//! A [`Mix`] comes from one of the built-in [`Profile`]s or from a YAML file:
//!
//! ```yaml
//! categories:
//!   - name: search
//!     proportion: 0.61
//!     renderer:
//!       type: search
//!       surface: api
//!   - name: bibs-updated
//!     proportion: 0.18
//!     renderer:
//!       type: record_query
//!       record_type: bibs
//!       fields: "default,fixedFields,varFields"
//!       query: updated
//! ```

use crate::error::PathGenError;
use crate::quota::Rounding;
use crate::resolve::{Endpoint, IdShape, ResolutionSpec};
use serde::{Deserialize, Serialize};

/// Fields selector for bib record queries.
pub const BIB_FIELDS: &str = "default,fixedFields,varFields,normTitle,normAuthor,orders,locations";
/// Fields selector for item record queries.
pub const ITEM_FIELDS: &str = "default,fixedFields,varFields";
/// Fields selector for holdings record queries.
pub const HOLDINGS_FIELDS: &str = "id,bibIds,bibIdLinks,itemIds,itemIdLinks,inheritLocation,allocationRule,accountingUnit,labelCode,serialCode1,serialCode2,serialCode3,serialCode4,claimOnDate,receivingLocationCode,vendorCode,updateCount,pieceCount,eCheckInCode,mediaTypeCode,updatedDate,createdDate,deletedDate,deleted,suppressed,fixedFields,varFields";
/// Fields selector for patron record queries.
pub const PATRON_FIELDS: &str = "id,names,barcodes,expirationDate,emails,patronType,homeLibraryCode,phones,moneyOwed,fixedFields";

/// URI prefix carried by discovery record identifiers.
pub const DISCOVERY_ID_PREFIX: &str = "res:";

/// Which user-facing surface a search or record-page path targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Discovery API routes (`/api/v0.1/discovery/...`)
    Api,
    /// Research-catalog front-end routes
    Catalog,
}

/// Filter family for a windowed or identity record query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Update-timestamp range filter
    Updated,
    /// Delete-timestamp range filter, day granularity
    Deleted,
    /// Direct identifier lookup (identifiers come from live resolution)
    Identity,
}

/// How one category's paths are produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Renderer {
    /// Keyword searches drawn from the keyword pool
    Search {
        /// Surface to render against
        surface: Surface,
    },
    /// Record detail pages for identifiers resolved from the discovery API
    RecordPage {
        /// Surface to render against
        surface: Surface,
    },
    /// Record API queries (windowed or identity) for one record type
    RecordQuery {
        /// Record type segment, e.g. `bibs`
        record_type: String,
        /// `fields` selector to request
        fields: String,
        /// Filter family
        query: QueryKind,
        /// Add `deleted=false` to resolution queries (patron queries do)
        #[serde(default)]
        exclude_deleted: bool,
    },
    /// Patron hold listings for resolved patron identifiers
    Holds,
    /// The static front-end home page
    Homepage,
    /// Subject-heading pages drawn from the navigation-URL pool
    SubjectHeadings,
}

impl Renderer {
    /// Rounding rule for this category's quota: round up when the category
    /// drives an external resolution step, down otherwise.
    pub fn rounding(&self) -> Rounding {
        if self.resolution_spec().is_some() {
            Rounding::Up
        } else {
            Rounding::Down
        }
    }

    /// The resolution query this renderer needs, if any.
    pub fn resolution_spec(&self) -> Option<ResolutionSpec> {
        match self {
            Renderer::RecordPage { .. } => Some(ResolutionSpec {
                endpoint: Endpoint::Discovery,
                record_type: "resources".to_string(),
                shape: IdShape::PrefixedUri {
                    prefix: DISCOVERY_ID_PREFIX.to_string(),
                },
                exclude_deleted: false,
            }),
            Renderer::RecordQuery {
                record_type,
                query: QueryKind::Identity,
                exclude_deleted,
                ..
            } => Some(ResolutionSpec {
                endpoint: Endpoint::Sierra,
                record_type: record_type.clone(),
                shape: IdShape::Plain,
                exclude_deleted: *exclude_deleted,
            }),
            Renderer::Holds => Some(ResolutionSpec {
                endpoint: Endpoint::Sierra,
                record_type: "patrons".to_string(),
                shape: IdShape::Plain,
                exclude_deleted: true,
            }),
            _ => None,
        }
    }

    /// Whether this renderer draws from the keyword seed pool.
    pub fn uses_keywords(&self) -> bool {
        matches!(self, Renderer::Search { .. })
    }

    /// Whether this renderer draws from the subject-heading seed pool.
    pub fn uses_subject_headings(&self) -> bool {
        matches!(self, Renderer::SubjectHeadings)
    }
}

/// A named class of synthetic request with its share of the total output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Category name, unique within a mix
    pub name: String,
    /// Share of the total in `(0, 1]`; shares need not sum to 1
    pub proportion: f64,
    /// How paths for this category are produced
    pub renderer: Renderer,
}

/// The full category mix for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mix {
    /// Categories to generate
    pub categories: Vec<Category>,
}

/// Built-in traffic profiles modeled on observed production breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Record API traffic: bibs/items/holdings windowed and identity
    /// queries, patron lookups, hold listings
    Sierra,
    /// Discovery API traffic: keyword searches and record lookups
    DiscoveryApi,
    /// Research-catalog page traffic: searches, bib pages, homepage,
    /// subject headings (intentionally sums below 1)
    ResearchCatalog,
}

impl Profile {
    /// The mix this profile expands to.
    pub fn mix(&self) -> Mix {
        match self {
            Profile::Sierra => sierra_mix(),
            Profile::DiscoveryApi => discovery_api_mix(),
            Profile::ResearchCatalog => research_catalog_mix(),
        }
    }
}

fn record_query(name: &str, proportion: f64, record_type: &str, fields: &str, query: QueryKind) -> Category {
    Category {
        name: name.to_string(),
        proportion,
        renderer: Renderer::RecordQuery {
            record_type: record_type.to_string(),
            fields: fields.to_string(),
            query,
            exclude_deleted: false,
        },
    }
}

/// Record API mix: bibs 0.3, items 0.3, holdings 0.1 (each split
/// updated 0.6 / deleted 0.1 / identity 0.3), patrons 0.2, holds 0.1.
fn sierra_mix() -> Mix {
    Mix {
        categories: vec![
            record_query("bibs-updated", 0.18, "bibs", BIB_FIELDS, QueryKind::Updated),
            record_query("bibs-deleted", 0.03, "bibs", BIB_FIELDS, QueryKind::Deleted),
            record_query("bibs-identity", 0.09, "bibs", BIB_FIELDS, QueryKind::Identity),
            record_query("items-updated", 0.18, "items", ITEM_FIELDS, QueryKind::Updated),
            record_query("items-deleted", 0.03, "items", ITEM_FIELDS, QueryKind::Deleted),
            record_query("items-identity", 0.09, "items", ITEM_FIELDS, QueryKind::Identity),
            record_query("holdings-updated", 0.06, "holdings", HOLDINGS_FIELDS, QueryKind::Updated),
            record_query("holdings-deleted", 0.01, "holdings", HOLDINGS_FIELDS, QueryKind::Deleted),
            record_query("holdings-identity", 0.03, "holdings", HOLDINGS_FIELDS, QueryKind::Identity),
            Category {
                name: "patrons".to_string(),
                proportion: 0.2,
                renderer: Renderer::RecordQuery {
                    record_type: "patrons".to_string(),
                    fields: PATRON_FIELDS.to_string(),
                    query: QueryKind::Identity,
                    exclude_deleted: true,
                },
            },
            Category {
                name: "holds".to_string(),
                proportion: 0.1,
                renderer: Renderer::Holds,
            },
        ],
    }
}

/// Discovery API mix: 61% keyword searches, 39% record lookups.
fn discovery_api_mix() -> Mix {
    Mix {
        categories: vec![
            Category {
                name: "search".to_string(),
                proportion: 0.61,
                renderer: Renderer::Search {
                    surface: Surface::Api,
                },
            },
            Category {
                name: "bib".to_string(),
                proportion: 0.39,
                renderer: Renderer::RecordPage {
                    surface: Surface::Api,
                },
            },
        ],
    }
}

/// Front-end page mix. The proportions sum to 0.73, so a run undershoots
/// the requested total; that matches the observed breakdown and is left
/// uncorrected.
fn research_catalog_mix() -> Mix {
    Mix {
        categories: vec![
            Category {
                name: "search".to_string(),
                proportion: 0.36,
                renderer: Renderer::Search {
                    surface: Surface::Catalog,
                },
            },
            Category {
                name: "bib".to_string(),
                proportion: 0.23,
                renderer: Renderer::RecordPage {
                    surface: Surface::Catalog,
                },
            },
            Category {
                name: "homepage".to_string(),
                proportion: 0.13,
                renderer: Renderer::Homepage,
            },
            Category {
                name: "subject-headings".to_string(),
                proportion: 0.01,
                renderer: Renderer::SubjectHeadings,
            },
        ],
    }
}

impl Mix {
    /// Load a mix from a YAML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, PathGenError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PathGenError::Configuration(format!("failed to read mix file {path:?}: {e}"))
        })?;
        let mix: Mix = serde_yaml::from_str(&content).map_err(|e| {
            PathGenError::Configuration(format!("failed to parse mix file {path:?}: {e}"))
        })?;
        mix.validate()?;
        Ok(mix)
    }

    /// Check category names are unique and proportions are in `(0, 1]`.
    pub fn validate(&self) -> Result<(), PathGenError> {
        if self.categories.is_empty() {
            return Err(PathGenError::Configuration(
                "mix contains no categories".into(),
            ));
        }
        let mut names = std::collections::HashSet::new();
        for category in &self.categories {
            if !names.insert(category.name.as_str()) {
                return Err(PathGenError::Configuration(format!(
                    "duplicate category name: {}",
                    category.name
                )));
            }
            if !(category.proportion > 0.0 && category.proportion <= 1.0) {
                return Err(PathGenError::Configuration(format!(
                    "category '{}' has proportion {} outside (0, 1]",
                    category.name, category.proportion
                )));
            }
        }
        Ok(())
    }

    /// Whether any category draws from the keyword seed pool.
    pub fn uses_keywords(&self) -> bool {
        self.categories.iter().any(|c| c.renderer.uses_keywords())
    }

    /// Whether any category draws from the subject-heading seed pool.
    pub fn uses_subject_headings(&self) -> bool {
        self.categories
            .iter()
            .any(|c| c.renderer.uses_subject_headings())
    }

    /// Whether any category resolves identifiers against the
    /// authenticated record API.
    pub fn needs_record_api_auth(&self) -> bool {
        self.categories.iter().any(|c| {
            c.renderer
                .resolution_spec()
                .is_some_and(|spec| spec.endpoint == Endpoint::Sierra)
        })
    }
}
