use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use ustr::Ustr;

use crate::hierarchy_types::{HierarchyItem, Position};

pub type Result<T> = std::result::Result<T, ServerError>;

// JSON parse errors are sticky data problems.
impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> ServerError {
        ServerError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::DataLayer,
            message: err.to_string(),
        })
    }
}

/// IO errors amount to a 404 for our purposes which means a sticky problem.
impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> ServerError {
        ServerError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::ServerLayer,
            message: err.to_string(),
        })
    }
}

/// Express whether the error seems to be happening in the backend or the data
/// it serves.
#[derive(Debug)]
pub enum ErrorLayer {
    /// The request itself has structural issues, like a location that cannot
    /// possibly anchor a hierarchy session.  Not used for a plain miss; a miss
    /// is part of the result payload (an empty item list).
    BadInput,
    /// The error seems to involve backend logic, so it may or may not be an
    /// issue with the underlying data.
    ServerLayer,
    /// The error seems to be related to the indexed type graph itself, like a
    /// relation table referencing a symbol that was never defined.
    DataLayer,
}

/// ServerError payload to provide details about what went wrong for
/// investigation purposes.
#[derive(Debug)]
pub struct ErrorDetails {
    pub layer: ErrorLayer,
    /// Stringified version of the lower level error.
    pub message: String,
}

#[derive(Debug)]
pub enum ServerError {
    /// An error that will persist for at least this backend instance.  For
    /// example, a graph file that does not parse.
    StickyProblem(ErrorDetails),
    /// An error that might go away if retried later.  For example, the
    /// analysis backend is still warming up.
    TransientProblem(ErrorDetails),
}

/// Traversal direction for a related-symbol query.  This is intentionally
/// narrower than the set of tree views; a view that is neither straight
/// ancestors nor straight descendants still has to pick one of these per
/// query.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelatedDirection {
    Supertypes,
    Subtypes,
}

impl RelatedDirection {
    pub fn name(&self) -> &'static str {
        match self {
            RelatedDirection::Supertypes => "supertypes",
            RelatedDirection::Subtypes => "subtypes",
        }
    }
}

/// The external type-hierarchy query service.  How the backend computes the
/// type relation from source code is opaque to us; this trait is the whole of
/// what the tree model consumes.
///
/// ## Runtime Assumptions
///
/// We assume a tokio runtime and that implementations of these methods either
/// complete quickly or responsibly suspend; the tree model drives everything
/// from a single logical task, so there is never more than one call in flight
/// per model except where the model itself interleaves sibling fetches.
#[async_trait]
pub trait HierarchyServer {
    /// Anchor a new hierarchy session at a source location.  An empty result
    /// means "no hierarchy available here" and the session is abandoned.
    async fn prepare_hierarchy(&self, uri: Ustr, pos: Position) -> Result<Vec<HierarchyItem>>;

    /// Fetch the symbols directly related to `item` in the given direction.
    /// `Ok(None)` means the backend had nothing to say, which callers must
    /// treat the same as an empty list.  Implementations should give up early
    /// (returning `Ok(None)`) once `cancel` trips; the token is shared across
    /// every query a model instance issues.
    async fn fetch_related(
        &self,
        item: &HierarchyItem,
        direction: RelatedDirection,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<HierarchyItem>>>;
}
