#[macro_export]
macro_rules! context_trait {
    ($err:path) => {
        /// attaches a short message to a failure before converting it
        pub trait Context<T, E> {
            fn context<C: Into<String>>(self, cxt: C) -> std::result::Result<T, $err>;
        }
    };
}
