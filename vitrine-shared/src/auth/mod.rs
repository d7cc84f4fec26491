/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and validation
/// - [`jwt`]: JWT token generation and validation
/// - [`middleware`]: Request auth context and error mapping
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **JWT Tokens**: HS256 signing, 24h access / 30d refresh tokens
/// - **Role Claims**: customer/admin role carried in the token, re-checked
///   by the admin middleware on every privileged route

pub mod jwt;
pub mod middleware;
pub mod password;
