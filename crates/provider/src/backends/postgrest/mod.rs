//! PostgREST request/response codec.
//!
//! Builder calls are encoded the way PostgREST expects them:
//!
//! | Call | Encoding |
//! |------|----------|
//! | `select(cols, count)` | `select=a,b` and `Prefer: count=exact` |
//! | `order(f, asc)` | `order=f.asc` |
//! | `match_all({f: v})` | `f=eq.v` |
//! | `range(from, to)` | `Range-Unit: items`, `Range: from-to` |
//! | `gte` / `lte` / `neq` | `f=gte.v`, `f=lte.v`, `f=neq.v` |
//! | `is` / `is_not` | `f=is.null`, `f=not.is.null` |
//! | `in_list` | `f=in.(a,b)` |
//! | `or(expr)` | `or=(expr)` |
//!
//! The total count comes back in the `Content-Range` header. Sending the
//! request is left to a [`PostgrestTransport`] implementation.

mod client;
mod request;
mod response;

pub use client::{PostgrestClient, PostgrestQuery, PostgrestTransport, render_plan};
pub use request::{HttpMethod, PostgrestRequest, render_value};
pub use response::{
    ContentRange, PostgrestErrorBody, PostgrestResponse, decode_error, decode_mutation,
    decode_rows,
};
