//! `Animator` global: animation descriptions scripts attach with
//! `view:setAnimator(a)`.

use std::time::Duration;

use mlua::prelude::*;
use mlua::{MetaMethod, UserData, UserDataMethods};

use super::convert::{Args, FromScript, Vector};
use crate::animation::{Animator, Curve};
use crate::error::{ConversionError, Error};
use crate::geometry::Size;

/// Userdata wrapper around an [`Animator`].
#[derive(Debug, Clone)]
pub struct ScriptAnimator(pub Animator);

fn edit(ud: &LuaAnyUserData, f: impl FnOnce(&mut Animator)) -> LuaResult<()> {
    f(&mut ud.borrow_mut::<ScriptAnimator>()?.0);
    Ok(())
}

impl UserData for ScriptAnimator {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        // Seconds, like the rest of the timing API.
        methods.add_function("setDuration", |_, (ud, seconds): (LuaAnyUserData, LuaValue)| {
            let seconds = f64::from_script(&seconds)?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(Error::invalid("setDuration", format!("duration must be a positive number of seconds, got {seconds}")).into());
            }
            edit(&ud, |a| a.duration = Duration::from_secs_f64(seconds))?;
            Ok(ud)
        });
        methods.add_function("setCurve", |_, (ud, curve): (LuaAnyUserData, Curve)| {
            edit(&ud, |a| a.curve = curve)?;
            Ok(ud)
        });
        methods.add_function("setRepeating", |_, (ud, repeating): (LuaAnyUserData, Option<bool>)| {
            edit(&ud, |a| a.repeating = repeating.unwrap_or(true))?;
            Ok(ud)
        });
        methods.add_function("pause", |_, ud: LuaAnyUserData| {
            edit(&ud, |a| a.paused = true)?;
            Ok(ud)
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(format!("Animator({})", this.0)));
    }
}

impl FromScript for Animator {
    const TYPE_NAME: &'static str = "Animator";

    fn from_script(value: &LuaValue) -> Result<Self, ConversionError> {
        let fail = || ConversionError::new("Animator", value.type_name(), "animator expected");
        match value {
            LuaValue::UserData(ud) => ud.borrow::<ScriptAnimator>().map(|a| a.0.clone()).map_err(|_| fail()),
            _ => Err(fail()),
        }
    }
}

impl IntoLua for Animator {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        lua.create_userdata(ScriptAnimator(self)).map(LuaValue::UserData)
    }
}

/// Parts of `fromCombination`: either varargs or a single list.
fn combination_parts(args: &Args) -> Result<Vec<Animator>, Error> {
    if let [LuaValue::Table(list)] = args.values() {
        return list
            .clone()
            .sequence_values::<LuaValue>()
            .enumerate()
            .map(|(i, v)| {
                let v = v.map_err(|e| Error::invalid("fromCombination", e.to_string()))?;
                Animator::from_script(&v).map_err(|_| {
                    Error::type_mismatch(format!("Animator (element {} of fromCombination)", i + 1), v.type_name())
                })
            })
            .collect();
    }
    (0..args.len()).map(|i| args.get::<Animator>(i)).collect()
}

/// Install the `Animator` table.
pub fn register(lua: &Lua) -> LuaResult<()> {
    let table = lua.create_table()?;
    table.set(
        "translation",
        lua.create_function(|_, values: LuaMultiValue| {
            let args = Args::new("Animator.translation", values);
            args.arity(2, 2)?;
            let point = |v: Vector<2>| [v.x() as f32, v.y() as f32];
            Ok(Animator::translation(point(args.get(0)?), point(args.get(1)?)))
        })?,
    )?;
    table.set(
        "size",
        lua.create_function(|_, values: LuaMultiValue| {
            let args = Args::new("Animator.size", values);
            args.arity(2, 2)?;
            Ok(Animator::size(args.get::<Size>(0)?, args.get::<Size>(1)?))
        })?,
    )?;
    table.set(
        "rotation",
        lua.create_function(|_, values: LuaMultiValue| {
            // Radians, unlike the degree-based style properties.
            let args = Args::new("Animator.rotation", values);
            args.arity(2, 2)?;
            Ok(Animator::rotation(args.get(0)?, args.get(1)?))
        })?,
    )?;
    table.set("placeholder", lua.create_function(|_, ()| Ok(Animator::placeholder()))?)?;
    table.set("focus", lua.create_function(|_, ()| Ok(Animator::focus()))?)?;
    table.set(
        "fromCombination",
        lua.create_function(|_, values: LuaMultiValue| {
            let args = Args::new("Animator.fromCombination", values);
            Ok(Animator::combination(combination_parts(&args)?))
        })?,
    )?;
    tracing::debug!("Animator registered");
    lua.globals().set("Animator", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationKind;
    use crate::script::enums;

    fn lua() -> Lua {
        let lua = Lua::new();
        enums::register_all(&lua).unwrap();
        register(&lua).unwrap();
        lua
    }

    fn eval(lua: &Lua, src: &str) -> Animator {
        let v: LuaValue = lua.load(src).eval().unwrap();
        Animator::from_script(&v).unwrap()
    }

    #[test]
    fn builders_chain() {
        let lua = lua();
        let a = eval(
            &lua,
            "return Animator.translation({0, 0}, {10, 20}):setDuration(0.5):setCurve(Curve.EASE_IN):setRepeating()",
        );
        assert_eq!(a.kind, AnimationKind::Translation { from: [0.0, 0.0], to: [10.0, 20.0] });
        assert_eq!(a.duration, Duration::from_millis(500));
        assert_eq!(a.curve, Curve::EaseIn);
        assert!(a.repeating);
        assert!(!a.paused);
    }

    #[test]
    fn rotation_takes_radians() {
        let lua = lua();
        let a = eval(&lua, "return Animator.rotation(0, math.pi)");
        match a.kind {
            AnimationKind::Rotation { from, to } => {
                assert_eq!(from, 0.0);
                assert!((to - std::f32::consts::PI).abs() < 1e-5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn size_and_focus_builders() {
        let lua = lua();
        let a = eval(&lua, "return Animator.size({10, 10}, {40, 20})");
        assert_eq!(a.kind, AnimationKind::Size { from: Size::new(10, 10), to: Size::new(40, 20) });
        assert_eq!(eval(&lua, "return Animator.focus()").kind, AnimationKind::Focus);
        let err = lua.load("Animator.size(1, 2)").exec().unwrap_err();
        assert!(err.to_string().contains("Animator.size"), "{err}");
    }

    #[test]
    fn combination_accepts_list_or_varargs() {
        let lua = lua();
        let a = eval(&lua, "return Animator.fromCombination(Animator.placeholder(), Animator.focus())");
        let b = eval(&lua, "return Animator.fromCombination({ Animator.placeholder(), Animator.focus() })");
        assert_eq!(a, b);
        let err = lua.load("Animator.fromCombination(1)").exec().unwrap_err();
        assert!(err.to_string().contains("type mismatch: expected Animator"));
    }

    #[test]
    fn negative_duration_is_rejected() {
        let lua = lua();
        let err = lua.load("Animator.placeholder():setDuration(-1)").exec().unwrap_err();
        assert!(err.to_string().contains("setDuration"));
    }
}
