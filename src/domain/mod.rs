pub mod ordering;
pub mod sorting;
pub mod study;

pub use ordering::{
    OrderedCollection, OrderedItem, Placement, ReorderCommand, ReorderRequest,
};
pub use sorting::{sort_studies, SortField, SortOrder};
pub use study::{Study, StudyId, Tag};
