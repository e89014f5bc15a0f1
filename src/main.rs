pub fn main() -> anyhow::Result<()> {
    spinning_cube::winit_integration::run()
}
