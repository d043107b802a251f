//! Item resolution: drawing items and expanding their template calls.
//!
//! Items may call these functions:
//!
//! - `lookup path [count]` draws from another table, `count` times
//! - `roll dice` rolls a dice spec; an invalid spec is printed as-is
//! - `fudge path dice [count]` redistributes a table's items under other dice
//! - `pick a b ...` picks one literal alternative
//! - `chance p fallback original` keeps `original` with probability `p`
//!
//! Paths starting with `./` are relative to the calling table's parent.
//! Every nested `lookup`/`fudge` draw spends one unit of a per-request
//! budget; once it is spent, lookups return their unresolved path and
//! fudges return nothing.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use mm_template::{FunctionHost, TemplateError, Value, check_arity};

use crate::dice::DiceSpec;
use crate::error::{TableError, TableResult};
use crate::path;
use crate::registry::Registry;
use crate::table::{RollingTable, Table};

/// Joins the results of multi-draw lookups.
const DRAW_SEPARATOR: &str = ", ";

/// Per-request resolution state.
///
/// Created for each top-level request and threaded through every nested
/// call, so concurrent requests against one registry never share a budget
/// or a random source.
#[derive(Debug)]
pub struct ResolveContext {
    draws: usize,
    max_draws: usize,
    rng: StdRng,
}

impl ResolveContext {
    /// Create a context allowing `max_draws` nested draws.
    pub fn new(max_draws: usize, seed: u64) -> Self {
        Self {
            draws: 0,
            max_draws,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Nested draws made so far.
    pub fn draws(&self) -> usize {
        self.draws
    }

    /// Nested draws still allowed.
    pub fn remaining(&self) -> usize {
        self.max_draws.saturating_sub(self.draws)
    }

    /// Spend one unit of budget. Returns false once the budget is spent.
    fn enter(&mut self) -> bool {
        if self.draws >= self.max_draws {
            return false;
        }
        self.draws += 1;
        true
    }
}

impl Registry {
    /// A fresh context for one top-level request.
    pub fn context(&self) -> ResolveContext {
        ResolveContext::new(self.config.max_lookup_depth, self.next_seed())
    }

    /// Draw an item from the table at `path` and render it.
    pub fn get_item(&self, path: &str) -> TableResult<String> {
        let mut ctx = self.context();
        self.get_item_with(path, &mut ctx)
    }

    /// Draw and render an item using a caller-supplied context.
    pub fn get_item_with(&self, path: &str, ctx: &mut ResolveContext) -> TableResult<String> {
        let (table, canonical) = self.get_table(path)?;
        let raw = table.get_item().unwrap_or_else(|| {
            debug!(table = %canonical, "draw produced no item");
            ""
        });
        trace!(table = %canonical, item = raw, "drew item");
        let formatted = self.formatter.format(raw, &canonical);
        self.render_in(&formatted, &canonical, ctx)
    }

    /// Render arbitrary item text as if it were drawn from `caller`.
    pub fn render_item(&self, text: &str, caller: &str) -> TableResult<String> {
        let mut ctx = self.context();
        self.render_in(text, &path::normalize(caller), &mut ctx)
    }

    /// Roll a dice spec outside of any table.
    pub fn roll(&self, spec: &str) -> Result<i64, crate::dice::DiceError> {
        let spec: DiceSpec = spec.parse()?;
        let mut rng = StdRng::seed_from_u64(self.next_seed());
        Ok(spec.roll(&mut rng))
    }

    pub(crate) fn render_in(
        &self,
        text: &str,
        caller: &str,
        ctx: &mut ResolveContext,
    ) -> TableResult<String> {
        let template = mm_template::parse(text)
            .map_err(|e| TableError::in_table(caller, TableError::Template(e)))?;
        if template.is_literal() {
            return Ok(text.to_string());
        }
        let mut host = Invocation {
            registry: self,
            caller,
            ctx,
        };
        mm_template::render(&template, &mut host).map_err(|e| TableError::in_table(caller, e))
    }
}

/// Template functions bound to one calling table.
struct Invocation<'a> {
    registry: &'a Registry,
    caller: &'a str,
    ctx: &'a mut ResolveContext,
}

impl FunctionHost for Invocation<'_> {
    type Error = TableError;

    fn call(&mut self, name: &str, args: Vec<Value>) -> TableResult<Value> {
        match name {
            "lookup" => self.lookup(args),
            "roll" => self.roll(args),
            "fudge" => self.fudge(args),
            "pick" => self.pick(args),
            "chance" => self.chance(args),
            other => Err(TemplateError::UnknownFunction(other.to_string()).into()),
        }
    }
}

impl Invocation<'_> {
    fn lookup(&mut self, args: Vec<Value>) -> TableResult<Value> {
        check_arity("lookup", &args, 1, 2)?;
        let target = path::resolve_relative(&args[0].to_string(), self.caller);
        let count = draw_count(args.get(1));

        let mut results = Vec::with_capacity(count.min(self.ctx.remaining() + 1));
        for _ in 0..count {
            if !self.ctx.enter() {
                debug!(caller = %self.caller, target = %target, "lookup budget spent");
                results.push(target.clone());
                break;
            }
            results.push(self.registry.get_item_with(&target, self.ctx)?);
        }
        Ok(Value::Str(results.join(DRAW_SEPARATOR)))
    }

    fn roll(&mut self, args: Vec<Value>) -> TableResult<Value> {
        check_arity("roll", &args, 1, 1)?;
        let text = args[0].to_string();
        match text.parse::<DiceSpec>() {
            Ok(spec) => Ok(Value::Int(spec.roll(&mut self.ctx.rng))),
            Err(_) => Ok(Value::Str(text)),
        }
    }

    fn fudge(&mut self, args: Vec<Value>) -> TableResult<Value> {
        check_arity("fudge", &args, 2, 3)?;
        let target = path::resolve_relative(&args[0].to_string(), self.caller);
        let dice = args[1].to_string();
        if let Err(e) = dice.parse::<DiceSpec>() {
            return Err(TemplateError::InvalidArgument {
                function: "fudge".to_string(),
                message: e.to_string(),
            }
            .into());
        }
        let count = draw_count(args.get(2));

        let (table, canonical) = self.registry.get_table(&target)?;
        let seed = self.ctx.rng.random();
        let fudged = RollingTable::from_items(dice, reindexed(table)).with_seed(seed);

        let mut results = Vec::with_capacity(count.min(self.ctx.remaining() + 1));
        for _ in 0..count {
            if !self.ctx.enter() {
                debug!(caller = %self.caller, target = %target, "fudge budget spent");
                break;
            }
            let raw = fudged.get_item().unwrap_or_default();
            let formatted = self.registry.formatter.format(raw, &canonical);
            results.push(self.registry.render_in(&formatted, &canonical, self.ctx)?);
        }
        Ok(Value::Str(results.join(DRAW_SEPARATOR)))
    }

    fn pick(&mut self, mut args: Vec<Value>) -> TableResult<Value> {
        check_arity("pick", &args, 1, usize::MAX)?;
        let idx = self.ctx.rng.random_range(0..args.len());
        Ok(args.swap_remove(idx))
    }

    fn chance(&mut self, mut args: Vec<Value>) -> TableResult<Value> {
        check_arity("chance", &args, 3, 3)?;
        let original = args.pop().unwrap_or_else(|| Value::Str(String::new()));
        let fallback = args.pop().unwrap_or_else(|| Value::Str(String::new()));
        let keep = match probability(&args[0]) {
            Some(p) => self.ctx.rng.random_bool(p),
            None => false,
        };
        Ok(if keep { original } else { fallback })
    }
}

/// The item mapping of `table` keyed for a new dice spec: rolling tables
/// keep their keys, other tables number their items from 1.
fn reindexed(table: &Table) -> Vec<(i64, String)> {
    match table {
        Table::Rolling(t) => t.entries().iter().map(|(k, v)| (*k, v.clone())).collect(),
        Table::Random(t) => (1..).zip(t.items().iter().cloned()).collect(),
        Table::Text(t) => vec![(1, t.get_item().to_string())],
    }
}

/// A draw count argument: integers or numeric strings, anything else
/// (including values below 1) counts as a single draw.
fn draw_count(arg: Option<&Value>) -> usize {
    match arg.and_then(Value::as_int) {
        Some(n) if n >= 1 => usize::try_from(n).unwrap_or(1),
        _ => 1,
    }
}

/// A probability in `[0, 1]`. Values above 1 are read as percentages.
fn probability(arg: &Value) -> Option<f64> {
    let p = arg.as_float().filter(|p| p.is_finite())?;
    let p = if p > 1.0 { p / 100.0 } else { p };
    Some(p.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::table::{RandomTable, TextTable};

    fn registry() -> Registry {
        Registry::with_config(RegistryConfig::default().with_seed(1234))
    }

    fn text(item: &str) -> TextTable {
        let mut t = TextTable::new();
        t.add_item(item);
        t
    }

    #[test]
    fn literal_items_pass_through() {
        let mut reg = registry();
        reg.add_table("t", text("Plain {braces} stay"), false);
        assert_eq!(reg.get_item("t").unwrap(), "Plain {braces} stay");
    }

    #[test]
    fn lookup_expands() {
        let mut reg = registry();
        reg.add_table("metal", text("iron"), false);
        reg.add_table("sword", text(r#"An {{lookup "metal"}} sword"#), false);
        assert_eq!(reg.get_item("sword").unwrap(), "An iron sword");
    }

    #[test]
    fn lookup_counts() {
        let mut reg = registry();
        reg.add_table("t1", text("one"), false);
        reg.add_table("t2", text(r#"{{lookup "t1" 2}}"#), false);
        reg.add_table("t3", text(r#"{{lookup "t1" "3"}}"#), false);
        reg.add_table("t4", text(r#"{{lookup "t1" "lots"}}"#), false);
        assert_eq!(reg.get_item("t2").unwrap(), "one, one");
        assert_eq!(reg.get_item("t3").unwrap(), "one, one, one");
        assert_eq!(reg.get_item("t4").unwrap(), "one");
    }

    #[test]
    fn relative_lookup() {
        let mut reg = registry();
        reg.add_table("nested/subnest/table", text("deep"), false);
        reg.add_table("nested/table", text(r#"{{lookup "./subnest/table"}}"#), false);
        assert_eq!(reg.get_item("nested/table").unwrap(), "deep");
    }

    #[test]
    fn roll_is_permissive() {
        let mut reg = registry();
        reg.add_table("fixed", text(r#"{{roll "3d1"}} gold"#), false);
        reg.add_table("bad", text(r#"{{roll "many"}} gold"#), false);
        assert_eq!(reg.get_item("fixed").unwrap(), "3 gold");
        assert_eq!(reg.get_item("bad").unwrap(), "many gold");
    }

    #[test]
    fn pick_chooses_an_alternative() {
        let mut reg = registry();
        reg.add_table("t", text(r#"a {{pick "red" "blue"}} door"#), false);
        for _ in 0..20 {
            let item = reg.get_item("t").unwrap();
            assert!(item == "a red door" || item == "a blue door", "{item}");
        }
    }

    #[test]
    fn chance_extremes() {
        let mut reg = registry();
        reg.add_table("always", text(r#"{{chance 1 "no" "yes"}}"#), false);
        reg.add_table("never", text(r#"{{chance 0 "no" "yes"}}"#), false);
        reg.add_table("percent", text(r#"{{ "yes" | chance 100 "no" }}"#), false);
        reg.add_table("junk", text(r#"{{chance "often" "no" "yes"}}"#), false);
        assert_eq!(reg.get_item("always").unwrap(), "yes");
        assert_eq!(reg.get_item("never").unwrap(), "no");
        assert_eq!(reg.get_item("percent").unwrap(), "yes");
        assert_eq!(reg.get_item("junk").unwrap(), "no");
    }

    #[test]
    fn fudge_does_not_mutate_source() {
        let mut reg = registry();
        let mut t1 = reg.rolling_table("1d4");
        t1.add_item("a", &[1]);
        t1.add_item("b", &[2]);
        t1.add_item("c", &[3]);
        t1.add_item("d", &[4]);
        reg.add_table("t1", t1, false);
        reg.add_table("f", text(r#"{{fudge "t1" "4d1" 2}}"#), false);

        assert_eq!(reg.get_item("f").unwrap(), "d, d");
        match reg.get_table("t1").unwrap().0 {
            Table::Rolling(t) => assert_eq!(t.dice(), "1d4"),
            other => panic!("expected rolling table, got {other:?}"),
        }
        let plain = reg.get_item("t1").unwrap();
        assert!(["a", "b", "c", "d"].contains(&plain.as_str()));
    }

    #[test]
    fn fudge_numbers_random_items_from_one() {
        let mut reg = registry();
        let mut colors = RandomTable::with_seed(3);
        for c in ["red", "green", "blue"] {
            colors.add_item(c);
        }
        reg.add_table("colors", colors, false);
        reg.add_table("f", text(r#"{{fudge "colors" "2d1"}}"#), false);
        assert_eq!(reg.get_item("f").unwrap(), "green");
    }

    #[test]
    fn fudge_rejects_bad_dice() {
        let mut reg = registry();
        reg.add_table("t1", text("x"), false);
        reg.add_table("f", text(r#"{{fudge "t1" "loads"}}"#), false);
        let err = reg.get_item("f").unwrap_err();
        assert!(matches!(
            err.root_cause(),
            TableError::Template(TemplateError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn self_reference_terminates() {
        let mut reg = registry();
        reg.add_table("loop", text(r#"x{{lookup "loop"}}"#), false);
        let item = reg.get_item("loop").unwrap();
        assert_eq!(item, format!("{}loop", "x".repeat(101)));
    }

    #[test]
    fn budget_is_per_request() {
        let mut reg = Registry::with_config(
            RegistryConfig::default().with_seed(1).with_max_lookup_depth(2),
        );
        reg.add_table("leaf", text("ok"), false);
        reg.add_table("root", text(r#"{{lookup "leaf" 3}}"#), false);
        assert_eq!(reg.get_item("root").unwrap(), "ok, ok, leaf");
        assert_eq!(reg.get_item("root").unwrap(), "ok, ok, leaf");
    }

    #[test]
    fn fudge_stops_drawing_when_budget_is_spent() {
        let mut reg = Registry::with_config(
            RegistryConfig::default().with_seed(1).with_max_lookup_depth(1),
        );
        reg.add_table("t1", text("x"), false);
        reg.add_table("f", text(r#"[{{fudge "t1" "1d1" 3}}]"#), false);
        assert_eq!(reg.get_item("f").unwrap(), "[x]");
    }

    #[test]
    fn self_fudge_terminates() {
        let mut reg = registry();
        reg.add_table("loop", text(r#"y{{fudge "loop" "1d1"}}"#), false);
        assert_eq!(reg.get_item("loop").unwrap(), "y".repeat(101));
    }

    #[test]
    fn html_output_survives_template_characters_in_paths() {
        let mut reg = Registry::with_config(
            RegistryConfig::default()
                .with_seed(1)
                .with_formatter(crate::format::FormatterKind::Html),
        );
        reg.add_table("o'brien/{{odd}}", text("plain"), false);
        reg.add_table("outer", text(r#"{{lookup "o'brien/{{odd}}"}}"#), false);
        assert_eq!(
            reg.get_item("o'brien/{{odd}}").unwrap(),
            "<RandomElement table='o&#39;brien/&#123;&#123;odd&#125;&#125;'>plain</RandomElement>"
        );
        assert!(reg.get_item("outer").unwrap().contains(">plain<"));
    }

    #[test]
    fn nested_missing_table_fails_containing_item() {
        let mut reg = registry();
        reg.add_table("outer", text(r#"{{lookup "inner"}}"#), false);
        reg.add_table("inner", text(r#"{{lookup "missing"}}"#), false);
        let err = reg.get_item("outer").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "in table \"outer\": in table \"inner\": table not found: missing"
        );
    }

    #[test]
    fn top_level_not_found_is_unwrapped() {
        let reg = registry();
        assert!(matches!(reg.get_item("Nope"), Err(TableError::NotFound(p)) if p == "nope"));
    }

    #[test]
    fn malformed_template_is_an_error() {
        let mut reg = registry();
        reg.add_table("broken", text(r#"{{lookup "x""#), false);
        reg.add_table("unknown", text("{{frobnicate}}"), false);
        assert!(matches!(
            reg.get_item("broken").unwrap_err().root_cause(),
            TableError::Template(TemplateError::Parse { .. })
        ));
        assert!(matches!(
            reg.get_item("unknown").unwrap_err().root_cause(),
            TableError::Template(TemplateError::UnknownFunction(_))
        ));
    }

    #[test]
    fn render_item_resolves_relative_to_caller() {
        let mut reg = registry();
        reg.add_table("places/name", text("Roogna"), false);
        assert_eq!(
            reg.render_item(r#"Castle {{lookup "./name"}}"#, "Places/Castle").unwrap(),
            "Castle Roogna"
        );
    }

    #[test]
    fn standalone_roll() {
        let reg = registry();
        assert_eq!(reg.roll("2d1+1").unwrap(), 3);
        assert!(reg.roll("nope").is_err());
    }

    #[test]
    fn context_tracks_budget() {
        let mut reg = registry();
        reg.add_table("leaf", text("leaf"), false);
        reg.add_table("root", text(r#"{{lookup "leaf" 2}}"#), false);
        let mut ctx = ResolveContext::new(10, 5);
        reg.get_item_with("root", &mut ctx).unwrap();
        assert_eq!(ctx.draws(), 2);
        assert_eq!(ctx.remaining(), 8);
    }

    #[test]
    fn draw_count_parsing() {
        assert_eq!(draw_count(None), 1);
        assert_eq!(draw_count(Some(&Value::Int(3))), 3);
        assert_eq!(draw_count(Some(&Value::Str("2".to_string()))), 2);
        assert_eq!(draw_count(Some(&Value::Int(0))), 1);
        assert_eq!(draw_count(Some(&Value::Str("x".to_string()))), 1);
    }

    #[test]
    fn probability_parsing() {
        assert_eq!(probability(&Value::Float(0.25)), Some(0.25));
        assert_eq!(probability(&Value::Int(50)), Some(0.5));
        assert_eq!(probability(&Value::Int(-3)), Some(0.0));
        assert_eq!(probability(&Value::Str("x".to_string())), None);
    }
}
