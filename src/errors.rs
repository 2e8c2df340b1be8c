//! Bootstrap errors: configuration, pool and migration failures raised
//! before the server starts handling requests.

use error_chain::error_chain;

error_chain! {
    foreign_links {
        Var(::std::env::VarError);
        ParseInt(::std::num::ParseIntError);
        R2D2(::r2d2::Error);
        Connection(::diesel::ConnectionError);
        Diesel(::diesel::result::Error);
    }

    errors {
        MissingSetting(name: &'static str) {
            description("required setting is missing")
            display("required setting is missing: {}", name)
        }

        Migration(reason: String) {
            description("failed to run database migrations")
            display("failed to run database migrations: {}", reason)
        }
    }
}
