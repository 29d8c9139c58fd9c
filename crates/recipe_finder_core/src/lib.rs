pub mod ai;
pub mod domain;
pub mod image;
pub mod library;
pub mod ports;
pub mod search;

#[cfg(any(test, feature = "fakes"))]
pub mod fakes;

pub use domain::{
    AiIngredient, AiRecipe, Facet, FacetCounts, HydratedSavedRecipe, ImagePayload, NewListItem, PantryItem,
    PromptMessage, Recipe, RecipeSummary, SavedRecipe, SearchPage, SearchResult, ShoppingItem,
};
pub use ports::{
    BlobStore, DocumentStore, Filter, ImageGenerationService, Order, Pause, PortError, PortResult,
    RecipeGenerationService, RecipeStore, SelectQuery,
};
