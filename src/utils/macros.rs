#[macro_export]
macro_rules! combine_traits {
    ($trait_name:ident: $($bounds:tt)+) => {
        pub trait $trait_name: $($bounds)+ {}
        impl<T: ?Sized + $($bounds)+> $trait_name for T {}
    };
}
