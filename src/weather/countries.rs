use isocountry::CountryCode;

/// English country name for an ISO 3166-1 alpha-2 code, case-insensitive
pub fn country_name(code: &str) -> Option<&'static str> {
    CountryCode::for_alpha2(&code.trim().to_ascii_uppercase())
        .ok()
        .map(|country| country.name())
}
