use crate::{CartesianPose, JointPose, TcsError};

/// Whitespace tokens of a trimmed reply line.
pub fn tokens(reply: &str) -> Vec<&str> {
    reply.split_whitespace().collect()
}

/// Second token of a reply, where the TCS puts the payload of most scalar
/// status queries (`hp`, `attach`, `pd`, `sysState`, `state`).
pub fn payload_token(reply: &str) -> Option<&str> {
    reply.split_whitespace().nth(1)
}

fn parse_floats<'a, I: Iterator<Item = &'a str>>(tokens: I, reply: &str) -> Result<Vec<f64>, TcsError> {
    tokens
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| TcsError::Protocol(format!("non-numeric token {t:?} in reply {reply:?}")))
        })
        .collect()
}

/// Parses a `wherej` reply: status token followed by the six axis values.
pub fn parse_joints(reply: &str) -> Result<JointPose, TcsError> {
    let values = parse_floats(reply.split_whitespace().skip(1), reply)?;
    if values.len() != 6 {
        return Err(TcsError::Protocol(format!(
            "expected 6 joint values, got {} in reply {reply:?}",
            values.len()
        )));
    }
    Ok(JointPose::from_values([
        values[0], values[1], values[2], values[3], values[4], values[5],
    ]))
}

/// Parses a `whereC` reply: status token, six pose values, then the rail
/// offset, which is dropped here (the rail travels on the joint side).
pub fn parse_cartesian(reply: &str) -> Result<CartesianPose, TcsError> {
    let toks = tokens(reply);
    if toks.len() < 8 {
        return Err(TcsError::Protocol(format!(
            "expected 8 tokens in cartesian reply, got {} in {reply:?}",
            toks.len()
        )));
    }
    let values = parse_floats(toks[1..toks.len() - 1].iter().copied(), reply)?;
    if values.len() != 6 {
        return Err(TcsError::Protocol(format!(
            "expected 6 cartesian values, got {} in reply {reply:?}",
            values.len()
        )));
    }
    Ok(CartesianPose::from_values([
        values[0], values[1], values[2], values[3], values[4], values[5],
    ]))
}
