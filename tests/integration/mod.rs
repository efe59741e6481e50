mod chunked_fetch;
mod postgrest_client;
