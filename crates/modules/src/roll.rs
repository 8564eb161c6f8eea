//! Dice roller. The whole expression arrives through one greedy trailing
//! parameter, so `!roll 2d6+1` and `!roll 2 d 6` both reach the parser.

use {
    async_trait::async_trait,
    rand::Rng,
    regex::Regex,
    std::sync::OnceLock,
};

use herald_commands::{
    Command, CommandError, CommandResult, Request, Response, Route,
};

const MAX_DICE: u32 = 100;
const MAX_FACES: u32 = 1000;

/// A parsed dice expression `NdM±K`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceExpr {
    pub dice: u32,
    pub faces: u32,
    pub modifier: i32,
}

#[allow(clippy::expect_used)] // static pattern, exercised by every test below
fn dice_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?<dice>\d*)\s*d\s*(?<faces>\d+)\s*(?<modifier>[+-]\s*\d+)?$")
            .expect("valid dice regex")
    })
}

/// Parse an expression like `2d6+1`, `d20`, or `3 d 8 - 2`.
pub fn parse_dice(raw: &str) -> Result<DiceExpr, String> {
    let pattern = dice_pattern();
    let compact = raw.trim().to_lowercase();
    let captures = pattern
        .captures(&compact)
        .ok_or_else(|| format!("'{raw}' is not a dice expression (try 2d6+1)"))?;

    let dice: u32 = match captures.name("dice").map(|m| m.as_str()) {
        None | Some("") => 1,
        Some(n) => n.parse().map_err(|_| "too many dice".to_string())?,
    };
    let faces: u32 = captures["faces"]
        .parse()
        .map_err(|_| "too many faces".to_string())?;
    let modifier: i32 = match captures.name("modifier") {
        None => 0,
        Some(m) => m
            .as_str()
            .replace(char::is_whitespace, "")
            .parse()
            .map_err(|_| "modifier out of range".to_string())?,
    };

    if dice == 0 || dice > MAX_DICE {
        return Err(format!("dice count must be between 1 and {MAX_DICE}"));
    }
    if faces < 2 || faces > MAX_FACES {
        return Err(format!("faces must be between 2 and {MAX_FACES}"));
    }
    Ok(DiceExpr {
        dice,
        faces,
        modifier,
    })
}

/// `!roll <expression>`.
pub struct RollCommand {
    routes: Vec<Route>,
}

impl Default for RollCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl RollCommand {
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: vec![Route::new("roll :expression")],
        }
    }
}

#[async_trait]
impl Command for RollCommand {
    fn module_id(&self) -> &str {
        "dice"
    }

    fn id(&self) -> &str {
        "roll"
    }

    fn routes(&self) -> &[Route] {
        &self.routes
    }

    async fn execute(&self, request: &Request, response: &mut Response) -> CommandResult {
        let raw = request.text("expression").unwrap_or_default();
        let expr = parse_dice(raw).map_err(CommandError::validation)?;

        let mut rng = rand::rng();
        let rolls: Vec<u32> = (0..expr.dice)
            .map(|_| rng.random_range(1..=expr.faces))
            .collect();
        let total: i64 = rolls.iter().map(|&r| i64::from(r)).sum::<i64>() + i64::from(expr.modifier);

        let detail = rolls
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" + ");
        let modifier = match expr.modifier {
            0 => String::new(),
            m if m > 0 => format!(" + {m}"),
            m => format!(" - {}", -m),
        };
        response.set_reply(format!("🎲 {raw} → {detail}{modifier} = {total}"));
        Ok(())
    }
}
