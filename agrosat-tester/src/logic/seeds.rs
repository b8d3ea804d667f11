use anyhow::{Context, Result, bail};

/// Longest inclusive range a single seed token may expand to.
const MAX_RANGE_LEN: u64 = 10_000;

/// Resolve CLI seed tokens into concrete seeds.
///
/// Accepts decimal literals, `0x` hex literals and inclusive ranges such as
/// `1-8`. Duplicates are dropped, first occurrence wins.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();
    for token in tokens {
        for seed in parse_token(token)? {
            if !seeds.contains(&seed) {
                seeds.push(seed);
            }
        }
    }
    if seeds.is_empty() {
        bail!("no seeds provided");
    }
    Ok(seeds)
}

fn parse_token(token: &str) -> Result<Vec<u64>> {
    if let Some((start, end)) = token.split_once('-') {
        let start = parse_literal(start)?;
        let end = parse_literal(end)?;
        if end < start {
            bail!("seed range {token} is reversed");
        }
        if end - start >= MAX_RANGE_LEN {
            bail!("seed range {token} spans more than {MAX_RANGE_LEN} seeds");
        }
        return Ok((start..=end).collect());
    }
    Ok(vec![parse_literal(token)?])
}

fn parse_literal(raw: &str) -> Result<u64> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed {raw}"));
    }
    raw.parse::<u64>()
        .with_context(|| format!("invalid seed {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn resolves_literals_hex_and_ranges() {
        let seeds = resolve_seed_inputs(&tokens(&["1337", "0x10", "3-5", "4"])).unwrap();
        assert_eq!(seeds, vec![1337, 16, 3, 4, 5]);
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(resolve_seed_inputs(&tokens(&["banana"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["9-2"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0-20000"])).is_err());
        assert!(resolve_seed_inputs(&[]).is_err());
    }
}
