//! Route handlers. Each returns an HTML fragment (or JSON / a `<script>`
//! snippet for persistence) for the page to swap in.

pub mod player;
pub mod quest;
pub mod util;
