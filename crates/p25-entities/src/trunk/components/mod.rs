pub mod adj_sites;
pub mod affiliations;
pub mod channel_grants;
pub mod status_cmd;
