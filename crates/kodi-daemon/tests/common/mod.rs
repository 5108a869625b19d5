pub mod fake_kodi;
