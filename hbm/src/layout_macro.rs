/// Create a layer in keymap
#[macro_export]
macro_rules! layer {
    ([$([$($x: expr), +]), +]) => {
        [$([$($x), +]),+]
    };
}

/// Create a normal key. For example, `k!(A)` represents `KeyAction::Single(Action::Key(KeyCode::Hid(HidKeyCode::A)))`
#[macro_export]
macro_rules! k {
    ($k: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::Key($crate::keycode::KeyCode::Hid(
            $crate::keycode::HidKeyCode::$k,
        )))
    };
}

/// Create a consumer page key, like `media!(VolumeIncrement)`
#[macro_export]
macro_rules! media {
    ($k: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::Key($crate::keycode::KeyCode::Consumer(
            $crate::keycode::ConsumerKey::$k,
        )))
    };
}

/// Create a normal key with modifier action
#[macro_export]
macro_rules! wm {
    ($x: ident, $m: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::KeyWithModifier(
            $crate::keycode::KeyCode::Hid($crate::keycode::HidKeyCode::$x),
            $m,
        ))
    };
}

/// Create a shifted key
#[macro_export]
macro_rules! shifted {
    ($x: ident) => {
        $crate::wm!($x, $crate::modifier::ModifierCombination::SHIFT)
    };
}

/// Create a symbol as typed with a UK host layout, like `uk!(PND)` for `£`
#[macro_export]
macro_rules! uk {
    ($s: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::KeyWithModifier(
            $crate::keycode::KeyCode::Hid($crate::keycode::uk::$s.0),
            $crate::keycode::uk::$s.1,
        ))
    };
}

/// Create a normal action: `KeyAction`
#[macro_export]
macro_rules! a {
    ($a: ident) => {
        $crate::action::KeyAction::$a
    };
}

/// Create a layer activate action. For example, `mo!(1)` activates layer 1.
#[macro_export]
macro_rules! mo {
    ($x: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::LayerOn($x))
    };
}

/// Create a modifier key, held while the key is held
#[macro_export]
macro_rules! mods {
    ($m: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::Modifier($m))
    };
}

/// Create a layer activate action or tap key(tap/hold)
#[macro_export]
macro_rules! lt {
    ($x: expr, $k: ident) => {
        $crate::action::KeyAction::TapHold(
            $crate::action::Action::Key($crate::keycode::KeyCode::Hid($crate::keycode::HidKeyCode::$k)),
            $crate::action::Action::LayerOn($x),
        )
    };
}

/// Create a modifier-tap-hold action
#[macro_export]
macro_rules! mt {
    ($k: ident, $m: expr) => {
        $crate::action::KeyAction::TapHold(
            $crate::action::Action::Key($crate::keycode::KeyCode::Hid($crate::keycode::HidKeyCode::$k)),
            $crate::action::Action::Modifier($m),
        )
    };
}

/// Create a tap-hold action
#[macro_export]
macro_rules! th {
    ($t: ident, $h: ident) => {
        $crate::action::KeyAction::TapHold(
            $crate::action::Action::Key($crate::keycode::KeyCode::Hid($crate::keycode::HidKeyCode::$t)),
            $crate::action::Action::Key($crate::keycode::KeyCode::Hid($crate::keycode::HidKeyCode::$h)),
        )
    };
}

/// Create an oneshot layer key in keymap
#[macro_export]
macro_rules! osl {
    ($x: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::OneShotLayer($x))
    };
}

/// Create an oneshot modifier key in keymap
#[macro_export]
macro_rules! osm {
    ($m: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::OneShotModifier($m))
    };
}

/// Create a layer toggle action
#[macro_export]
macro_rules! tg {
    ($x: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::LayerToggle($x))
    };
}

/// create a switch default layer action, `n` is the layer number
#[macro_export]
macro_rules! df {
    ($x: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::DefaultLayer($x))
    };
}

/// Create a tap dance key, referencing the tap dance config by index
#[macro_export]
macro_rules! td {
    ($index: expr) => {
        $crate::action::KeyAction::TapDance($index)
    };
}

/// Create a custom key, handled by userspace callbacks
#[macro_export]
macro_rules! user {
    ($key: ident) => {
        $crate::action::KeyAction::Single($crate::userspace::CustomKey::$key.action())
    };
}
