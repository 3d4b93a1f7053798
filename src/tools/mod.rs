//! Agent tools
//!
//! Named, schema-described, read-only functions the model may request instead
//! of answering directly. Each tool wraps one catalog query and never lets a
//! store error escape: failures render as a `ToolOutcome::Failure`.

pub mod orchestrator;

use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::types::{Film, ParamSpec, ToolDescriptor, ToolOutcome};

pub use orchestrator::ToolOrchestrator;

/// A callable unit exposed to the LLM backend
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    /// Human-readable description handed to the model; may embed live catalog
    /// state (the genre tool lists the genres currently present).
    fn description(&self) -> String;

    fn parameters(&self) -> Vec<ParamSpec>;

    /// Execute with the model-supplied arguments. Must not panic or raise;
    /// every call produces exactly one outcome.
    fn execute(&self, args: &Map<String, Value>) -> ToolOutcome;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description(),
            parameters: self.parameters(),
        }
    }
}

/// All film tools over the given catalog
pub fn create_film_tools(catalog: Arc<CatalogStore>) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(SearchByTitle {
            catalog: catalog.clone(),
        }),
        Box::new(FilterByGenre {
            catalog: catalog.clone(),
        }),
        Box::new(SearchByRating {
            catalog: catalog.clone(),
        }),
        Box::new(SearchByActor { catalog }),
    ]
}

fn films_payload(films: Vec<Film>) -> Value {
    json!({
        "count": films.len(),
        "films": films,
    })
}

fn str_arg<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn num_arg(args: &Map<String, Value>, key: &str) -> Option<f64> {
    args.get(key).and_then(Value::as_f64)
}

struct SearchByTitle {
    catalog: Arc<CatalogStore>,
}

impl Tool for SearchByTitle {
    fn name(&self) -> &'static str {
        "search_by_title"
    }

    fn description(&self) -> String {
        "Search for films by title. Supports partial matches and is case-insensitive. \
         Returns up to 10 matching films."
            .to_string()
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "title",
            "string",
            "The film title or partial title to search for",
        )]
    }

    fn execute(&self, args: &Map<String, Value>) -> ToolOutcome {
        let Some(title) = str_arg(args, "title") else {
            return ToolOutcome::failure("Missing required parameter: title");
        };
        match self.catalog.search_by_title(title) {
            Ok(films) => ToolOutcome::success(films_payload(films)),
            Err(e) => ToolOutcome::failure(e.to_string()),
        }
    }
}

struct FilterByGenre {
    catalog: Arc<CatalogStore>,
}

impl Tool for FilterByGenre {
    fn name(&self) -> &'static str {
        "filter_by_genre"
    }

    fn description(&self) -> String {
        let genres = self.catalog.all_genres().unwrap_or_default();
        let listing = if genres.is_empty() {
            "various genres".to_string()
        } else {
            genres.join(", ")
        };
        format!("Filter films by genre. Available genres include: {listing}. Returns up to 20 films.")
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "genre",
            "string",
            "The genre to filter by (e.g., 'Sci-Fi', 'Action', 'Drama', 'Thriller')",
        )]
    }

    fn execute(&self, args: &Map<String, Value>) -> ToolOutcome {
        let Some(genre) = str_arg(args, "genre") else {
            return ToolOutcome::failure("Missing required parameter: genre");
        };
        match self.catalog.filter_by_genre(genre) {
            Ok(films) => {
                let mut payload = films_payload(films);
                payload["genre"] = json!(genre);
                ToolOutcome::success(payload)
            }
            Err(e) => ToolOutcome::failure(e.to_string()),
        }
    }
}

struct SearchByRating {
    catalog: Arc<CatalogStore>,
}

impl Tool for SearchByRating {
    fn name(&self) -> &'static str {
        "search_by_rating"
    }

    fn description(&self) -> String {
        "Search for films within a rating range. Ratings are on a scale of 0-10. \
         Returns up to 20 films sorted by rating."
            .to_string()
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("min_rating", "number", "Minimum rating (0-10)"),
            ParamSpec::optional(
                "max_rating",
                "number",
                "Maximum rating (0-10). Defaults to 10.0 if not specified.",
            ),
        ]
    }

    fn execute(&self, args: &Map<String, Value>) -> ToolOutcome {
        let Some(min_rating) = num_arg(args, "min_rating") else {
            return ToolOutcome::failure("Missing required parameter: min_rating");
        };
        let max_rating = num_arg(args, "max_rating").unwrap_or(10.0);
        match self.catalog.search_by_rating(min_rating, max_rating) {
            Ok(films) => {
                let mut payload = films_payload(films);
                payload["rating_range"] = json!(format!("{min_rating}-{max_rating}"));
                ToolOutcome::success(payload)
            }
            Err(e) => ToolOutcome::failure(e.to_string()),
        }
    }
}

struct SearchByActor {
    catalog: Arc<CatalogStore>,
}

impl Tool for SearchByActor {
    fn name(&self) -> &'static str {
        "search_by_actor"
    }

    fn description(&self) -> String {
        "Search for films featuring a specific actor. Supports partial name matches \
         and is case-insensitive. Returns up to 20 films."
            .to_string()
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "actor_name",
            "string",
            "The actor's name or partial name to search for",
        )]
    }

    fn execute(&self, args: &Map<String, Value>) -> ToolOutcome {
        let Some(actor_name) = str_arg(args, "actor_name") else {
            return ToolOutcome::failure("Missing required parameter: actor_name");
        };
        match self.catalog.search_by_actor(actor_name) {
            Ok(films) => {
                let mut payload = films_payload(films);
                payload["actor"] = json!(actor_name);
                ToolOutcome::success(payload)
            }
            Err(e) => ToolOutcome::failure(e.to_string()),
        }
    }
}
