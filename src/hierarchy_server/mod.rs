mod local_graph;
mod server_interface;

pub use local_graph::{make_graph_server, make_local_graph_server, LocalGraph};
pub use server_interface::{
    ErrorDetails, ErrorLayer, HierarchyServer, RelatedDirection, Result, ServerError,
};
