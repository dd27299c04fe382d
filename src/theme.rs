use ratatui::style::Color;

use crate::view::ColorScheme;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub panel_bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub secondary: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static DARK: Theme = Theme {
  name: "dark",
  bg: Color::Rgb(0x12, 0x12, 0x12),
  panel_bg: Color::Rgb(0x1e, 0x1e, 0x1e),
  fg: Color::Rgb(0xe0, 0xe0, 0xe0),
  accent: Color::Rgb(0x90, 0xca, 0xf9),
  secondary: Color::Rgb(0xf4, 0x8f, 0xb1),
  muted: Color::Rgb(0x8a, 0x8a, 0x8a),
  border: Color::Rgb(0x3a, 0x3a, 0x3a),
  highlight_fg: Color::Rgb(0x12, 0x12, 0x12),
  highlight_bg: Color::Rgb(0x90, 0xca, 0xf9),
  stripe_bg: Color::Rgb(0x1a, 0x1a, 0x1a),
  status: Color::Rgb(0x64, 0xb5, 0xf6),
  error: Color::Rgb(0xef, 0x53, 0x50),
  key_fg: Color::Rgb(0x12, 0x12, 0x12),
  key_bg: Color::Rgb(0x8a, 0x8a, 0x8a),
};

pub static LIGHT: Theme = Theme {
  name: "light",
  bg: Color::Rgb(0xfa, 0xfa, 0xfa),
  panel_bg: Color::Rgb(0xf0, 0xf0, 0xf0),
  fg: Color::Rgb(0x21, 0x21, 0x21),
  accent: Color::Rgb(0x19, 0x76, 0xd2),
  secondary: Color::Rgb(0xdc, 0x00, 0x4e),
  muted: Color::Rgb(0x75, 0x75, 0x75),
  border: Color::Rgb(0xbd, 0xbd, 0xbd),
  highlight_fg: Color::Rgb(0xff, 0xff, 0xff),
  highlight_bg: Color::Rgb(0x19, 0x76, 0xd2),
  stripe_bg: Color::Rgb(0xf2, 0xf2, 0xf2),
  status: Color::Rgb(0x21, 0x96, 0xf3),
  error: Color::Rgb(0xd3, 0x2f, 0x2f),
  key_fg: Color::Rgb(0xff, 0xff, 0xff),
  key_bg: Color::Rgb(0x75, 0x75, 0x75),
};

pub fn theme_for(scheme: ColorScheme) -> &'static Theme {
  match scheme {
    ColorScheme::Dark => &DARK,
    ColorScheme::Light => &LIGHT,
  }
}
