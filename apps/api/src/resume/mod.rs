// Résumé endpoint: parse request → build query → shape document → assemble response.
// Store access goes through `AppState.store`; nothing here holds a connection.

pub mod handlers;
pub mod params;
pub mod query;
pub mod response;
pub mod transform;
