/// Returns the first value of `name` in an `application/x-www-form-urlencoded`
/// body. `+` decodes to a space before percent-decoding; invalid UTF-8 is
/// replaced rather than rejected.
pub fn form_field(body: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
