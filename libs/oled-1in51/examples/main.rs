use chrono::{Local, Timelike};
use embedded_graphics::{
    mono_font::{MonoTextStyleBuilder, ascii::FONT_10X20, ascii::FONT_6X10},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use oled_1in51::{BusKind, Device, DeviceConfig};
use std::time::Duration;

const TIME_TEXT_POS: Point = Point::new(24, 30);
const CLOCK_TICKS: u32 = 10;

fn main() -> oled_1in51::OledResult<()> {
    env_logger::init();
    log::info!("OLED_1in51 Demo");

    let bus = match std::env::args().nth(1).as_deref() {
        Some("i2c") => BusKind::I2c,
        _ => BusKind::Spi,
    };
    let mut device = Device::new(DeviceConfig {
        bus: Some(bus),
        ..DeviceConfig::default()
    })?;

    device.display.clear_panel()?;
    draw_frame(&mut device)?;

    for _ in 0..CLOCK_TICKS {
        draw_clock(&mut device.display)?;
        device.display.update()?;
        std::thread::sleep(Duration::from_secs(1));
    }

    log::info!("Demo finished. Shutting down.");
    device.close()
}

fn draw_frame(device: &mut Device) -> oled_1in51::OledResult<()> {
    device.display.clear(BinaryColor::Off)?;

    let bounding_box = device.display.bounding_box();
    log::debug!(
        "left: {}, size: {}",
        bounding_box.top_left,
        bounding_box.size
    );
    Rectangle::new(bounding_box.top_left, bounding_box.size)
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(&mut device.display)?;

    let title_style = MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build();
    let text_style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Top)
        .build();
    Text::with_text_style("OLED 1.51", Point::new(64, 4), title_style, text_style)
        .draw(&mut device.display)?;

    device.display.update()
}

fn draw_clock<D: DrawTarget<Color = BinaryColor>>(display: &mut D) -> Result<(), D::Error> {
    let time_text_style = MonoTextStyleBuilder::new()
        .font(&FONT_10X20)
        .text_color(BinaryColor::On)
        .background_color(BinaryColor::Off)
        .build();
    let now = Local::now();
    let time_str = format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second());
    Text::with_baseline(&time_str, TIME_TEXT_POS, time_text_style, Baseline::Top).draw(display)?;
    Ok(())
}
