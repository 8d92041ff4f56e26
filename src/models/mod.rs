pub mod activity;
pub mod address;
pub mod business;
pub mod development;
pub mod household;
pub mod lamp;
pub mod member;
pub mod road;

fn required(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(())
    }
}
