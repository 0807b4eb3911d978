//! Error types for the library, generated by `error_chain!`.
//!
//! Every checked failure is raised before the grid is mutated, apart from
//! `InternalConsistency` which can only be detected part way through carving.

use error_chain::error_chain;

error_chain! {

    foreign_links {
        Io(::std::io::Error);
    }

    errors {
        /// Wrong arity, non-positive axis length, duplicate key or a malformed encoded field.
        ArgumentInvalid(detail: String) {
            description("invalid argument")
            display("invalid argument: {}", detail)
        }

        /// Axis index beyond the dimension count or a coordinate outside the grid bounds.
        OutOfRange(detail: String) {
            description("value out of range")
            display("out of range: {}", detail)
        }

        /// The operation is not available in this build.
        UnsupportedOperation(detail: String) {
            description("unsupported operation")
            display("unsupported operation: {}", detail)
        }

        /// The backtrack stack ran dry with cells still unvisited.
        InternalConsistency(visited: usize, target: usize) {
            description("maze carving ran out of routes")
            display("no more route at size: {} (max: {})", visited, target)
        }
    }
}
