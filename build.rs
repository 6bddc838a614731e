use cfg_aliases::cfg_aliases;

fn main() {
    cfg_aliases! {
        // Any logging backend is selected. The `fmt` macros are no-ops otherwise.
        logging: { any(feature = "defmt", feature = "log") },
    }
}
