pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod auth_token;
pub mod course;
pub mod enrollment;
pub mod payment;
pub mod review;

#[cfg(test)]
mod tests;
