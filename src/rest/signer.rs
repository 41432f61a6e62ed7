/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

/// Name of the parameter carrying the request signature
pub const SIGNATURE_PARAM: &str = "api_sig";

/// Concatenates `name + value` for every pair, ordered by name
pub fn signature_base<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = params.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)));
    pairs.into_iter().fold(String::new(), |mut acc, (name, value)| {
        acc.push_str(name);
        acc.push_str(value);
        acc
    })
}

/// Computes the request signature.
///
/// MD5 over `shared_secret` followed by [`signature_base`], rendered as uppercase hex.
/// Only text parameters take part; file payloads are never signed.
pub fn sign<'a, I>(shared_secret: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut data = String::from(shared_secret);
    data.push_str(&signature_base(params));
    let digest = md5::compute(data.as_bytes());
    digest.0.iter().map(|b| format!("{:02X}", b)).collect()
}
